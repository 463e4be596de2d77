//! Procedural mono waveforms usable as sound content.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::f32::consts::TAU;

use crate::audio_traits::{SoundData, SoundStream};

/// Default oscillator sample rate in Hz.
pub const DEFAULT_OSCILLATOR_RATE: u32 = 44100;

/// Waveform shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Value of the waveform at `t` cycles, in `[-1, 1]`.
    pub fn sample(self, t: f32) -> f32 {
        match self {
            Waveform::Sine => libm::sinf(t * TAU),
            Waveform::Square => libm::fmodf(libm::roundf(t * 2.0 + 0.5), 2.0) * 2.0 - 1.0,
            Waveform::Sawtooth => libm::fmodf(t + 0.5, 1.0) * 2.0 - 1.0,
            Waveform::Triangle => {
                libm::fabsf(libm::fmodf(t + 0.75, 1.0) * 2.0 - 1.0) * 2.0 - 1.0
            }
        }
    }
}

/// A mono oscillator as sound content.
#[derive(Clone, Copy, Debug)]
pub struct OscillatorData {
    frequency: f32,
    waveform: Waveform,
    amplitude: f32,
    /// Length in seconds; `0.0` plays forever.
    length: f32,
    sample_rate: u32,
}

impl OscillatorData {
    /// Create an oscillator at [`DEFAULT_OSCILLATOR_RATE`].
    pub fn new(frequency: f32, waveform: Waveform, amplitude: f32, length: f32) -> Self {
        Self {
            frequency,
            waveform,
            amplitude,
            length: length.max(0.0),
            sample_rate: DEFAULT_OSCILLATOR_RATE,
        }
    }

    /// Generate at a different native sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Total frames, or `None` when the oscillator is endless.
    pub fn total_frames(&self) -> Option<u64> {
        (self.length > 0.0).then(|| libm::roundf(self.length * self.sample_rate as f32) as u64)
    }
}

impl SoundData for OscillatorData {
    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn create_stream(&self) -> Box<dyn SoundStream> {
        Box::new(OscillatorStream {
            data: *self,
            phase: 0.0,
            position: 0,
        })
    }
}

/// Playback cursor over an [`OscillatorData`].
pub struct OscillatorStream {
    data: OscillatorData,
    /// Position within the current cycle, `[0, 1)`.
    phase: f64,
    position: u64,
}

impl SoundStream for OscillatorStream {
    fn fetch(&mut self, frames: u32, samples: &mut Vec<f32>) -> u32 {
        samples.clear();
        samples.resize(frames as usize, 0.0);

        let count = match self.data.total_frames() {
            Some(total) => (frames as u64).min(total.saturating_sub(self.position)) as usize,
            None => frames as usize,
        };

        let step = if self.data.sample_rate == 0 {
            0.0
        } else {
            self.data.frequency as f64 / self.data.sample_rate as f64
        };

        for out in &mut samples[..count] {
            *out = self.data.waveform.sample(self.phase as f32) * self.data.amplitude;
            self.phase += step;
            self.phase -= libm::floor(self.phase);
        }
        self.position += count as u64;
        count as u32
    }

    fn is_finished(&self) -> bool {
        self.data
            .total_frames()
            .is_some_and(|total| self.position >= total)
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.position = 0;
    }
}
