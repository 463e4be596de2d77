//! Multichannel f32 audio buffer with planar layout.

use alloc::vec;
use alloc::vec::Vec;

/// Largest channel count any supported speaker layout uses.
pub const MAX_CHANNELS: u16 = 6;

/// A multichannel f32 audio buffer in planar layout.
///
/// Data is stored as `channels` contiguous planes of `frames` samples each.
/// `data[ch * frames + frame]` gives the sample for channel `ch` at `frame`.
/// This is the layout every render path in the mixer uses.
#[derive(Clone, Debug, Default)]
pub struct AudioBuffer {
    data: Vec<f32>,
    channels: u16,
    frames: u32,
}

impl AudioBuffer {
    /// Create a new silent buffer with the given dimensions.
    pub fn new(channels: u16, frames: u32) -> Self {
        Self {
            data: vec![0.0; channels as usize * frames as usize],
            channels,
            frames,
        }
    }

    /// Wrap existing planar samples.
    ///
    /// # Panics
    /// If `data.len()` is not `channels * frames`.
    pub fn from_planar(channels: u16, frames: u32, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), channels as usize * frames as usize, "planar length mismatch");
        Self { data, channels, frames }
    }

    /// Change the dimensions and silence the contents.
    ///
    /// Only allocates when the new size exceeds the capacity reached so far,
    /// so a buffer reused at a steady tick size stays allocation-free.
    pub fn resize(&mut self, channels: u16, frames: u32) {
        self.channels = channels;
        self.frames = frames;
        self.data.clear();
        self.data.resize(channels as usize * frames as usize, 0.0);
    }

    /// Fill all samples with zero.
    pub fn silence(&mut self) {
        self.data.fill(0.0);
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// All samples, channel-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// All samples, channel-major, mutable.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Read-only access to one channel's sample data.
    pub fn channel(&self, ch: u16) -> &[f32] {
        let start = ch as usize * self.frames as usize;
        &self.data[start..start + self.frames as usize]
    }

    /// Mutable access to one channel's sample data.
    pub fn channel_mut(&mut self, ch: u16) -> &mut [f32] {
        let start = ch as usize * self.frames as usize;
        let len = self.frames as usize;
        &mut self.data[start..start + len]
    }

    /// Sum overlapping channels from `source` into this buffer.
    pub fn mix_from(&mut self, source: &AudioBuffer) {
        let chs = self.channels.min(source.channels);
        let frs = self.frames.min(source.frames) as usize;
        for ch in 0..chs {
            let dst = self.channel_mut(ch);
            let src = source.channel(ch);
            for i in 0..frs {
                dst[i] += src[i];
            }
        }
    }

    /// Clamp every sample into `[min, max]`.
    pub fn clamp(&mut self, min: f32, max: f32) {
        for s in &mut self.data {
            *s = s.clamp(min, max);
        }
    }
}
