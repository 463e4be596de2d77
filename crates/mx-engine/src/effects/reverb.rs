//! Feedback comb reverb.

use alloc::vec::Vec;

use mx_core::MAX_CHANNELS;

use crate::effect::{Effect, EffectInfo, ParamInfo};

static PARAMS: &[ParamInfo] = &[
    ParamInfo {
        id: 0,
        name: "Delay (s)",
        min: 0.0,
        max: 2.0,
        default: 0.1,
    },
    ParamInfo {
        id: 1,
        name: "Decay",
        min: 0.0,
        max: 1.0,
        default: 0.5,
    },
];

static INFO: EffectInfo = EffectInfo {
    name: "Reverb",
    short_name: "Verb",
    params: PARAMS,
};

/// Dry signal plus echoes every `delay` seconds, each scaled by `decay`.
pub struct Reverb {
    delay: f32,
    decay: f32,
    lines: Vec<Vec<f32>>,
}

impl Reverb {
    pub fn new(delay: f32, decay: f32) -> Self {
        Self {
            delay: PARAMS[0].clamp(delay),
            decay: PARAMS[1].clamp(decay),
            lines: (0..MAX_CHANNELS).map(|_| Vec::new()).collect(),
        }
    }
}

impl Effect for Reverb {
    fn info(&self) -> &EffectInfo {
        &INFO
    }

    fn process(&mut self, frames: u32, channels: u16, sample_rate: u32, samples: &mut [f32]) {
        let frames = frames as usize;
        let delay_frames = (self.delay * sample_rate as f32) as usize;
        let decay = self.decay;

        for (ch, line) in self.lines.iter_mut().enumerate().take(channels as usize) {
            line.resize(frames + delay_frames, 0.0);
            let block = &mut samples[ch * frames..(ch + 1) * frames];

            for (slot, &input) in line.iter_mut().zip(block.iter()) {
                *slot += input;
            }
            // feedback runs forward so echoes shorter than the block recirculate
            for f in 0..frames {
                line[f + delay_frames] += line[f] * decay;
            }
            block.copy_from_slice(&line[..frames]);

            line.copy_within(frames.., 0);
            line[delay_frames..].fill(0.0);
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.fill(0.0);
        }
    }

    fn set_param(&mut self, param: u16, value: f32) -> bool {
        match param {
            0 => self.delay = PARAMS[0].clamp(value),
            1 => self.decay = PARAMS[1].clamp(value),
            _ => return false,
        }
        true
    }

    fn param(&self, param: u16) -> Option<f32> {
        match param {
            0 => Some(self.delay),
            1 => Some(self.decay),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_produces_decaying_echoes() {
        // echo every 2 frames at 10 Hz, half amplitude each time
        let mut r = Reverb::new(0.2, 0.5);
        let mut out = Vec::new();
        let mut block = [1.0f32, 0.0, 0.0];
        r.process(3, 1, 10, &mut block);
        out.extend_from_slice(&block);
        for _ in 0..2 {
            let mut block = [0.0f32; 3];
            r.process(3, 1, 10, &mut block);
            out.extend_from_slice(&block);
        }
        assert_eq!(out, [1.0, 0.0, 0.5, 0.0, 0.25, 0.0, 0.125, 0.0, 0.0625]);
    }

    #[test]
    fn zero_decay_is_dry() {
        let mut r = Reverb::new(0.1, 0.0);
        let mut block = [0.5f32, -0.5, 0.25];
        r.process(3, 1, 10, &mut block);
        assert_eq!(block, [0.5, -0.5, 0.25]);
    }

    #[test]
    fn params_round_trip_through_ids() {
        let mut r = Reverb::new(0.1, 0.5);
        assert!(r.set_param(1, 2.0));
        assert_eq!(r.param(1), Some(1.0));
        assert!(r.set_param(0, 0.3));
        assert_eq!(r.param(0), Some(0.3));
        assert!(!r.set_param(2, 0.0));
    }
}
