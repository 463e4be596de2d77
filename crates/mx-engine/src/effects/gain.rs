//! Decibel gain.

use crate::effect::{Effect, EffectInfo, ParamInfo};

static PARAMS: &[ParamInfo] = &[ParamInfo {
    id: 0,
    name: "Gain (dB)",
    min: -96.0,
    max: 24.0,
    default: 0.0,
}];

static INFO: EffectInfo = EffectInfo {
    name: "Gain",
    short_name: "Gain",
    params: PARAMS,
};

/// Multiplies every sample by `10^(dB/20)`.
pub struct Gain {
    gain_db: f32,
    factor: f32,
}

impl Gain {
    pub fn new(gain_db: f32) -> Self {
        let mut gain = Self { gain_db: 0.0, factor: 1.0 };
        gain.set_gain(gain_db);
        gain
    }

    fn set_gain(&mut self, gain_db: f32) {
        self.gain_db = PARAMS[0].clamp(gain_db);
        self.factor = 10f32.powf(self.gain_db / 20.0);
    }
}

impl Effect for Gain {
    fn info(&self) -> &EffectInfo {
        &INFO
    }

    fn process(&mut self, _frames: u32, _channels: u16, _sample_rate: u32, samples: &mut [f32]) {
        for s in samples {
            *s *= self.factor;
        }
    }

    fn reset(&mut self) {}

    fn set_param(&mut self, param: u16, value: f32) -> bool {
        match param {
            0 => {
                self.set_gain(value);
                true
            }
            _ => false,
        }
    }

    fn param(&self, param: u16) -> Option<f32> {
        (param == 0).then_some(self.gain_db)
    }
}
