//! WAV encoding for 16-bit PCM.

use std::io::Write;

/// Encode planar f32 `samples` (`channels` planes of equal length) as a
/// 16-bit PCM WAV file. Samples are clamped to `[-1, 1]`.
pub fn write_wav(
    w: &mut impl Write,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
) -> std::io::Result<()> {
    let bits_per_sample: u16 = 16;
    let block_align = channels * (bits_per_sample / 8);
    let frames = if channels == 0 { 0 } else { samples.len() / channels as usize };
    let data_size = frames as u32 * block_align as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, channels, sample_rate, block_align, bits_per_sample)?;
    write_data_chunk(w, samples, channels as usize, frames, data_size)
}

pub fn samples_to_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    write_wav(&mut buf, samples, channels, sample_rate).expect("Vec<u8> write cannot fail");
    buf
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(
    w: &mut impl Write,
    num_channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())
}

fn write_data_chunk(
    w: &mut impl Write,
    samples: &[f32],
    channels: usize,
    frames: usize,
    data_size: u32,
) -> std::io::Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    // planar in, interleaved out
    for f in 0..frames {
        for ch in 0..channels {
            w.write_all(&to_i16(samples[ch * frames + f]).to_le_bytes())?;
        }
    }
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
