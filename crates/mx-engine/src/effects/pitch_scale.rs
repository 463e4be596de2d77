//! Pitch scaling through the STFT shifter.

use alloc::vec::Vec;

use mx_core::MAX_CHANNELS;

use crate::effect::{Effect, EffectInfo, ParamInfo};
use crate::stft::{PitchShifter, MAX_RATIO, MIN_RATIO};

static PARAMS: &[ParamInfo] = &[ParamInfo {
    id: 0,
    name: "Ratio",
    min: MIN_RATIO,
    max: MAX_RATIO,
    default: 1.0,
}];

static INFO: EffectInfo = EffectInfo {
    name: "Pitch Scale",
    short_name: "Pitch",
    params: PARAMS,
};

/// Shifts pitch by a ratio while keeping duration, one shifter per channel.
pub struct PitchScale {
    ratio: f32,
    shifters: Vec<PitchShifter>,
}

impl PitchScale {
    pub fn new(ratio: f32) -> Self {
        Self {
            ratio: PARAMS[0].clamp(ratio),
            shifters: (0..MAX_CHANNELS).map(|_| PitchShifter::default()).collect(),
        }
    }
}

impl Effect for PitchScale {
    fn info(&self) -> &EffectInfo {
        &INFO
    }

    fn process(&mut self, frames: u32, channels: u16, _sample_rate: u32, samples: &mut [f32]) {
        let frames = frames as usize;
        let planes = samples.chunks_exact_mut(frames.max(1)).take(channels as usize);
        for (shifter, plane) in self.shifters.iter_mut().zip(planes) {
            shifter.process(self.ratio, plane);
        }
    }

    fn reset(&mut self) {
        for shifter in &mut self.shifters {
            shifter.reset();
        }
    }

    fn set_param(&mut self, param: u16, value: f32) -> bool {
        match param {
            0 => {
                self.ratio = PARAMS[0].clamp(value);
                true
            }
            _ => false,
        }
    }

    fn param(&self, param: u16) -> Option<f32> {
        (param == 0).then_some(self.ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifters_exist_before_first_block() {
        let mut p = PitchScale::new(1.0);
        assert_eq!(p.shifters.len(), MAX_CHANNELS as usize);
        let mut buf = vec![0.0f32; 3 * 64];
        p.process(64, 3, 44100, &mut buf);
        assert_eq!(p.shifters.len(), MAX_CHANNELS as usize);
    }

    #[test]
    fn output_is_delayed_by_one_frame() {
        // impulse in the right channel only
        let frames = 256u32;
        let mut p = PitchScale::new(1.0);
        let mut out_right = Vec::new();
        for block in 0..8 {
            let mut buf = vec![0.0f32; 2 * frames as usize];
            if block == 0 {
                buf[frames as usize + 10] = 1.0;
            }
            p.process(frames, 2, 44100, &mut buf);
            assert!(buf[..frames as usize].iter().all(|s| s.abs() < 1e-6));
            out_right.extend_from_slice(&buf[frames as usize..]);
        }
        let peak = out_right
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(10 + 1024));
    }

    #[test]
    fn ratio_param_is_clamped() {
        let mut p = PitchScale::new(4.0);
        assert_eq!(p.param(0), Some(2.0));
        assert!(p.set_param(0, 0.1));
        assert_eq!(p.param(0), Some(0.5));
    }
}
