//! Plain delay line.

use alloc::vec::Vec;

use mx_core::MAX_CHANNELS;

use crate::effect::{Effect, EffectInfo, ParamInfo};

static PARAMS: &[ParamInfo] = &[ParamInfo {
    id: 0,
    name: "Delay (s)",
    min: 0.0,
    max: 4.0,
    default: 0.1,
}];

static INFO: EffectInfo = EffectInfo {
    name: "Delay",
    short_name: "Delay",
    params: PARAMS,
};

/// Delays each channel by `delay * sample_rate` frames.
///
/// Each channel keeps a line of `frames + delay_frames` samples: the block is
/// added at offset `delay_frames`, the head is emitted, and the line shifts
/// left by `frames`.
pub struct Delay {
    delay: f32,
    lines: Vec<Vec<f32>>,
}

impl Delay {
    pub fn new(delay: f32) -> Self {
        Self {
            delay: PARAMS[0].clamp(delay),
            lines: (0..MAX_CHANNELS).map(|_| Vec::new()).collect(),
        }
    }
}

impl Effect for Delay {
    fn info(&self) -> &EffectInfo {
        &INFO
    }

    fn process(&mut self, frames: u32, channels: u16, sample_rate: u32, samples: &mut [f32]) {
        let frames = frames as usize;
        let delay_frames = (self.delay * sample_rate as f32) as usize;
        let line_len = frames + delay_frames;

        for (ch, line) in self.lines.iter_mut().enumerate().take(channels as usize) {
            line.resize(line_len, 0.0);
            let block = &mut samples[ch * frames..(ch + 1) * frames];

            for (slot, &input) in line[delay_frames..].iter_mut().zip(block.iter()) {
                *slot += input;
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
            0 => {
                self.delay = PARAMS[0].clamp(value);
                true
            }
            _ => false,
        }
    }

    fn param(&self, param: u16) -> Option<f32> {
        (param == 0).then_some(self.delay)
    }
}
