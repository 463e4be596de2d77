//! Decoded PCM content held in memory.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::audio_traits::{SoundData, SoundStream};

/// In-memory planar f32 sound content.
///
/// The samples are shared with every stream created from it, so a stream
/// keeps playing after the `PcmData` itself is dropped.
#[derive(Clone, Debug)]
pub struct PcmData {
    channels: u16,
    sample_rate: u32,
    frames: usize,
    samples: Arc<[f32]>,
}

impl PcmData {
    /// Wrap planar samples (`channels` planes of equal length).
    ///
    /// # Panics
    /// If `channels` is zero or `samples.len()` is not a multiple of it.
    pub fn from_planar(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        assert!(channels > 0, "PCM data needs at least one channel");
        assert_eq!(samples.len() % channels as usize, 0, "ragged planar PCM data");
        Self {
            channels,
            sample_rate,
            frames: samples.len() / channels as usize,
            samples: samples.into(),
        }
    }

    /// De-interleave frame-ordered samples (`L R L R ...`) into planar storage.
    ///
    /// # Panics
    /// If `channels` is zero or `samples.len()` is not a multiple of it.
    pub fn from_interleaved(channels: u16, sample_rate: u32, samples: &[f32]) -> Self {
        assert!(channels > 0, "PCM data needs at least one channel");
        let chs = channels as usize;
        assert_eq!(samples.len() % chs, 0, "partial frame in interleaved PCM data");
        let frames = samples.len() / chs;

        let mut planar = Vec::with_capacity(samples.len());
        for ch in 0..chs {
            planar.extend(samples.iter().skip(ch).step_by(chs).copied());
        }
        debug_assert_eq!(planar.len(), frames * chs);
        Self::from_planar(channels, sample_rate, planar)
    }

    /// Content length in frames.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl SoundData for PcmData {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn create_stream(&self) -> Box<dyn SoundStream> {
        Box::new(PcmStream {
            samples: Arc::clone(&self.samples),
            channels: self.channels as usize,
            frames: self.frames,
            position: 0,
        })
    }
}

/// Playback cursor over [`PcmData`].
pub struct PcmStream {
    samples: Arc<[f32]>,
    channels: usize,
    frames: usize,
    position: usize,
}

impl SoundStream for PcmStream {
    fn fetch(&mut self, frames: u32, samples: &mut Vec<f32>) -> u32 {
        let want = frames as usize;
        samples.clear();
        samples.resize(want * self.channels, 0.0);

        let count = want.min(self.frames - self.position);
        for ch in 0..self.channels {
            let start = ch * self.frames + self.position;
            samples[ch * want..ch * want + count]
                .copy_from_slice(&self.samples[start..start + count]);
        }
        self.position += count;
        count as u32
    }

    fn is_finished(&self) -> bool {
        self.position >= self.frames
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn fetch_reads_until_end() {
        let data = PcmData::from_planar(1, 44100, vec![1.0, 0.0, -1.0, 0.0]);
        let mut stream = data.create_stream();
        let mut buf = Vec::new();

        assert_eq!(stream.fetch(3, &mut buf), 3);
        assert_eq!(buf, vec![1.0, 0.0, -1.0]);
        assert!(!stream.is_finished());

        assert_eq!(stream.fetch(3, &mut buf), 1);
        assert_eq!(buf, vec![0.0, 0.0, 0.0]);
        assert!(stream.is_finished());

        assert_eq!(stream.fetch(2, &mut buf), 0);
        stream.reset();
        assert!(!stream.is_finished());
        assert_eq!(stream.fetch(1, &mut buf), 1);
        assert_eq!(buf, vec![1.0]);
    }

    #[test]
    fn interleaved_input_is_stored_planar() {
        let data = PcmData::from_interleaved(2, 48000, &[1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        assert_eq!(data.frames(), 3);
        assert_eq!(data.channels(), 2);

        let mut stream = data.create_stream();
        let mut buf = Vec::new();
        assert_eq!(stream.fetch(2, &mut buf), 2);
        assert_eq!(buf, vec![1.0, 2.0, -1.0, -2.0]);
    }

    #[test]
    fn stream_outlives_data() {
        let data = PcmData::from_planar(1, 8000, vec![0.25; 4]);
        let mut stream = data.create_stream();
        drop(data);
        let mut buf = Vec::new();
        assert_eq!(stream.fetch(4, &mut buf), 4);
        assert_eq!(buf, vec![0.25; 4]);
    }
}
