//! Linear sample-rate conversion on planar buffers.

/// Resample planar `src` (`channels` planes of `src_frames`) into planar `dst`
/// (`channels` planes of `dst_frames`) by linear interpolation.
///
/// The first and last destination frames always equal the first and last
/// source frames. Equal frame counts copy bit-for-bit; an empty source yields
/// silence.
///
/// # Panics
/// If either slice is shorter than its declared dimensions.
pub fn resample(channels: u16, src_frames: u32, src: &[f32], dst_frames: u32, dst: &mut [f32]) {
    let src_len = src_frames as usize;
    let dst_len = dst_frames as usize;
    let chs = channels as usize;
    assert!(src.len() >= chs * src_len, "source shorter than channels * frames");
    assert!(dst.len() >= chs * dst_len, "destination shorter than channels * frames");

    if dst_len == 0 {
        return;
    }

    if src_len == 0 {
        dst[..chs * dst_len].fill(0.0);
        return;
    }

    if src_len == dst_len {
        dst[..chs * dst_len].copy_from_slice(&src[..chs * src_len]);
        return;
    }

    let increment = if dst_len > 1 {
        (src_len - 1) as f64 / (dst_len - 1) as f64
    } else {
        0.0
    };

    for ch in 0..chs {
        let src_ch = &src[ch * src_len..(ch + 1) * src_len];
        let dst_ch = &mut dst[ch * dst_len..(ch + 1) * dst_len];

        for (frame, out) in dst_ch[..dst_len - 1].iter_mut().enumerate() {
            let position = frame as f64 * increment;
            let current = (position as usize).min(src_len - 1);
            let next = (current + 1).min(src_len - 1);
            let fraction = (position - current as f64) as f32;
            *out = lerp(src_ch[current], src_ch[next], fraction);
        }

        // no extrapolation past the final source frame
        dst_ch[dst_len - 1] = src_ch[src_len - 1];
    }
}

/// Number of source frames needed to produce `frames` frames at `rate` from
/// content at `source_rate`, rounded up.
pub fn source_frames(frames: u32, source_rate: u32, rate: u32) -> u32 {
    if rate == 0 {
        return 0;
    }
    let needed = (frames as u64 * source_rate as u64).div_ceil(rate as u64);
    needed.min(u32::MAX as u64) as u32
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
