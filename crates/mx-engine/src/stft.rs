//! STFT phase-vocoder pitch shifter.
//!
//! One [`PitchShifter`] holds the persistent state for a single channel:
//! input/output FIFOs, analysis and synthesis phase per bin, and the
//! overlap-add accumulator. Samples are pushed through one at a time; every
//! `step = frame_size / oversample` samples a full frame is analysed,
//! remapped in frequency, resynthesised and overlap-added.
//!
//! Frequencies are tracked in units of bins rather than Hz, so the shifter
//! does not need to know the sample rate.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::TAU;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

/// Default analysis frame length.
pub const DEFAULT_FRAME_SIZE: usize = 1024;
/// Default overlap factor.
pub const DEFAULT_OVERSAMPLE: usize = 4;

/// Lowest accepted pitch ratio (one octave down).
pub const MIN_RATIO: f32 = 0.5;
/// Highest accepted pitch ratio (one octave up).
pub const MAX_RATIO: f32 = 2.0;

pub struct PitchShifter {
    frame_size: usize,
    oversample: usize,
    step: usize,

    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,

    window: Vec<f32>,
    /// Overlap-add gain correction: `N * sum(w^2) / step`.
    output_scale: f32,

    in_fifo: Vec<f32>,
    out_fifo: Vec<f32>,
    accum: Vec<f32>,
    rover: usize,

    last_phase: Vec<f32>,
    sum_phase: Vec<f32>,
    ana_magn: Vec<f32>,
    ana_freq: Vec<f32>,
    syn_magn: Vec<f32>,
    syn_freq: Vec<f32>,
}

impl PitchShifter {
    /// Create a shifter with the given frame size and overlap factor.
    ///
    /// # Panics
    /// If `frame_size` is not a power of two or `oversample` does not divide it.
    pub fn new(frame_size: usize, oversample: usize) -> Self {
        assert!(frame_size.is_power_of_two(), "frame size must be a power of two");
        assert!(
            oversample > 0 && frame_size % oversample == 0,
            "oversample must divide the frame size"
        );
        let step = frame_size / oversample;
        let bins = frame_size / 2 + 1;

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(frame_size);
        let inverse = planner.plan_fft_inverse(frame_size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        let window: Vec<f32> = (0..frame_size)
            .map(|k| -0.5 * libm::cosf(TAU * k as f32 / frame_size as f32) + 0.5)
            .collect();
        let power: f32 = window.iter().map(|w| w * w).sum();
        let output_scale = frame_size as f32 * power / step as f32;

        Self {
            frame_size,
            oversample,
            step,
            forward,
            inverse,
            scratch: vec![Complex32::default(); scratch_len],
            spectrum: vec![Complex32::default(); frame_size],
            window,
            output_scale,
            in_fifo: vec![0.0; frame_size],
            out_fifo: vec![0.0; frame_size],
            accum: vec![0.0; frame_size],
            rover: frame_size - step,
            last_phase: vec![0.0; bins],
            sum_phase: vec![0.0; bins],
            ana_magn: vec![0.0; bins],
            ana_freq: vec![0.0; bins],
            syn_magn: vec![0.0; bins],
            syn_freq: vec![0.0; bins],
        }
    }

    /// Delay between an input sample and its resynthesised output, in samples.
    ///
    /// This is the full `frame_size`, not `frame_size - step`: the input FIFO
    /// starts `frame_size - step` samples deep, and a synthesised frame is
    /// read out one `step` after it is analysed.
    pub fn latency(&self) -> usize {
        self.frame_size
    }

    /// Clear all signal history.
    pub fn reset(&mut self) {
        self.in_fifo.fill(0.0);
        self.out_fifo.fill(0.0);
        self.accum.fill(0.0);
        self.last_phase.fill(0.0);
        self.sum_phase.fill(0.0);
        self.rover = self.frame_size - self.step;
    }

    /// Shift `samples` in place by `ratio` (clamped to `[0.5, 2.0]`).
    pub fn process(&mut self, ratio: f32, samples: &mut [f32]) {
        let ratio = ratio.clamp(MIN_RATIO, MAX_RATIO);
        let latency = self.frame_size - self.step;

        for sample in samples {
            self.in_fifo[self.rover] = *sample;
            *sample = self.out_fifo[self.rover - latency];
            self.rover += 1;

            if self.rover >= self.frame_size {
                self.rover = latency;
                self.process_frame(ratio);
            }
        }
    }

    fn process_frame(&mut self, ratio: f32) {
        let n = self.frame_size;
        let half = n / 2;
        let expected = TAU * self.step as f32 / n as f32;
        let oversample = self.oversample as f32;

        for (bin, (&x, &w)) in self.spectrum.iter_mut().zip(self.in_fifo.iter().zip(&self.window)) {
            *bin = Complex32::new(x * w, 0.0);
        }
        self.forward.process_with_scratch(&mut self.spectrum, &mut self.scratch);

        // analysis
        for k in 0..=half {
            let bin = self.spectrum[k];
            let edge = k == 0 || k == half;
            let magn = if edge { bin.norm() } else { 2.0 * bin.norm() };
            let phase = bin.im.atan2(bin.re);

            let delta = wrap_phase(phase - self.last_phase[k] - k as f32 * expected);
            self.last_phase[k] = phase;

            self.ana_magn[k] = magn;
            self.ana_freq[k] = k as f32 + oversample * delta / TAU;
        }

        // shift
        self.syn_magn.fill(0.0);
        self.syn_freq.fill(0.0);
        for k in 0..=half {
            let target = libm::roundf(k as f32 * ratio) as usize;
            if target > half {
                continue;
            }
            self.syn_magn[target] += self.ana_magn[k];
            self.syn_freq[target] = self.ana_freq[k] * ratio;
        }

        // synthesis
        for k in 0..=half {
            let deviation = self.syn_freq[k] - k as f32;
            let advance = TAU * deviation / oversample + k as f32 * expected;
            self.sum_phase[k] = wrap_phase(self.sum_phase[k] + advance);
            self.spectrum[k] = Complex32::from_polar(self.syn_magn[k], self.sum_phase[k]);
        }
        for bin in &mut self.spectrum[half + 1..] {
            *bin = Complex32::default();
        }
        self.inverse.process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let scale = self.output_scale;
        for ((acc, &w), bin) in self.accum.iter_mut().zip(&self.window).zip(&self.spectrum) {
            *acc += w * bin.re / scale;
        }

        let step = self.step;
        self.out_fifo[..step].copy_from_slice(&self.accum[..step]);
        self.accum.copy_within(step.., 0);
        self.accum[n - step..].fill(0.0);
        self.in_fifo.copy_within(step.., 0);
    }
}

impl Default for PitchShifter {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_SIZE, DEFAULT_OVERSAMPLE)
    }
}

/// Fold a phase into `[-PI, PI]`.
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    phase - TAU * libm::roundf(phase / TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    fn sine(freq: f32, rate: f32, len: usize) -> Vec<f32> {
        (0..len).map(|i| (TAU * freq * i as f32 / rate).sin() * 0.5).collect()
    }

    /// Estimate frequency from positive-going zero crossings.
    fn crossing_rate(buf: &[f32], rate: f32) -> f32 {
        let crossings = buf.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        crossings as f32 * rate / buf.len() as f32
    }

    #[test]
    fn wrap_phase_folds_into_range() {
        assert!((wrap_phase(3.0 * PI) - PI).abs() < 1e-5 || (wrap_phase(3.0 * PI) + PI).abs() < 1e-5);
        assert!((wrap_phase(0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_phase(-TAU - 0.25) + 0.25).abs() < 1e-5);
    }

    #[test]
    fn unity_ratio_reproduces_input_after_latency() {
        let input = sine(440.0, 44100.0, 8192);
        let mut output = input.clone();
        let mut shifter = PitchShifter::default();
        for block in output.chunks_mut(512) {
            shifter.process(1.0, block);
        }

        let latency = shifter.latency();
        assert_eq!(latency, DEFAULT_FRAME_SIZE);
        assert_ne!(latency, DEFAULT_FRAME_SIZE - DEFAULT_FRAME_SIZE / DEFAULT_OVERSAMPLE);
        let max_err = (2 * latency..input.len())
            .map(|n| (output[n] - input[n - latency]).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 1e-3, "max error {}", max_err);
    }

    #[test]
    fn octave_up_doubles_frequency() {
        let rate = 44100.0;
        let mut buf = sine(344.53125, rate, 16384); // bin 8 at N=1024
        let mut shifter = PitchShifter::default();
        shifter.process(2.0, &mut buf);

        let tail = &buf[4096..];
        let freq = crossing_rate(tail, rate);
        assert!((freq - 689.0625).abs() < 15.0, "estimated {} Hz", freq);
    }

    #[test]
    fn ratio_is_clamped() {
        let input = sine(440.0, 44100.0, 4096);
        let mut a = input.clone();
        let mut b = input.clone();
        PitchShifter::default().process(8.0, &mut a);
        PitchShifter::default().process(MAX_RATIO, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn reset_restores_initial_state() {
        let input = sine(440.0, 44100.0, 3000);
        let mut shifter = PitchShifter::default();
        let mut first = input.clone();
        shifter.process(1.5, &mut first);

        shifter.reset();
        let mut second = input.clone();
        shifter.process(1.5, &mut second);
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic]
    fn non_power_of_two_frame_panics() {
        let _ = PitchShifter::new(1000, 4);
    }
}
