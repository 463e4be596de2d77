//! One-pole RC low-pass and high-pass filters.

use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::TAU;

use mx_core::MAX_CHANNELS;

use crate::effect::{Effect, EffectInfo, ParamInfo};

static PARAMS: &[ParamInfo] = &[ParamInfo {
    id: 0,
    name: "Cutoff (Hz)",
    min: 20.0,
    max: 20000.0,
    default: 1000.0,
}];

static LOW_PASS_INFO: EffectInfo = EffectInfo {
    name: "Low Pass",
    short_name: "LPF",
    params: PARAMS,
};

static HIGH_PASS_INFO: EffectInfo = EffectInfo {
    name: "High Pass",
    short_name: "HPF",
    params: PARAMS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    LowPass,
    HighPass,
}

/// Per-channel filter memory.
#[derive(Clone, Copy, Default)]
struct Pole {
    prev_in: f32,
    prev_out: f32,
}

/// One-pole RC filter.
///
/// Low-pass: `y = y_prev + a * (x - y_prev)` with `a = dt / (rc + dt)`.
/// High-pass: `y = a * (y_prev + x - x_prev)` with `a = rc / (rc + dt)`.
pub struct OnePole {
    mode: Mode,
    cutoff_hz: f32,
    poles: Vec<Pole>,
}

impl OnePole {
    pub fn low_pass(cutoff_hz: f32) -> Self {
        Self::new(Mode::LowPass, cutoff_hz)
    }

    pub fn high_pass(cutoff_hz: f32) -> Self {
        Self::new(Mode::HighPass, cutoff_hz)
    }

    fn new(mode: Mode, cutoff_hz: f32) -> Self {
        Self {
            mode,
            cutoff_hz: PARAMS[0].clamp(cutoff_hz),
            poles: vec![Pole::default(); MAX_CHANNELS as usize],
        }
    }

    fn coefficient(&self, sample_rate: u32) -> f32 {
        let rc = 1.0 / (TAU * self.cutoff_hz);
        let dt = 1.0 / sample_rate.max(1) as f32;
        match self.mode {
            Mode::LowPass => dt / (rc + dt),
            Mode::HighPass => rc / (rc + dt),
        }
    }
}

impl Effect for OnePole {
    fn info(&self) -> &EffectInfo {
        match self.mode {
            Mode::LowPass => &LOW_PASS_INFO,
            Mode::HighPass => &HIGH_PASS_INFO,
        }
    }

    fn process(&mut self, frames: u32, channels: u16, sample_rate: u32, samples: &mut [f32]) {
        let frames = frames as usize;
        let a = self.coefficient(sample_rate);
        for (ch, pole) in self.poles.iter_mut().enumerate().take(channels as usize) {
            let block = &mut samples[ch * frames..(ch + 1) * frames];
            let mut state = *pole;
            match self.mode {
                Mode::LowPass => {
                    for s in block {
                        state.prev_out += a * (*s - state.prev_out);
                        *s = state.prev_out;
                    }
                }
                Mode::HighPass => {
                    for s in block {
                        let x = *s;
                        state.prev_out = a * (state.prev_out + x - state.prev_in);
                        state.prev_in = x;
                        *s = state.prev_out;
                    }
                }
            }
            *pole = state;
        }
    }

    fn reset(&mut self) {
        self.poles.fill(Pole::default());
    }

    fn set_param(&mut self, param: u16, value: f32) -> bool {
        match param {
            0 => {
                self.cutoff_hz = PARAMS[0].clamp(value);
                true
            }
            _ => false,
        }
    }

    fn param(&self, param: u16) -> Option<f32> {
        (param == 0).then_some(self.cutoff_hz)
    }
}
