//! Built-in effect implementations.

mod delay;
mod filter;
mod gain;
mod pitch_scale;
mod reverb;

use alloc::boxed::Box;
use serde::{Deserialize, Serialize};

use crate::effect::Effect;

pub use delay::Delay;
pub use filter::OnePole;
pub use gain::Gain;
pub use pitch_scale::PitchScale;
pub use reverb::Reverb;

/// Plain-data description of an effect and its initial parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    Gain { db: f32 },
    Delay { seconds: f32 },
    Reverb { delay: f32, decay: f32 },
    PitchScale { ratio: f32 },
    LowPass { cutoff: f32 },
    HighPass { cutoff: f32 },
}

/// Build the effect described by `kind`.
///
/// Called on the producer side so that per-channel state for every supported
/// layout (FFT plans, filter memory, delay line slots) exists before the
/// effect reaches the render thread. Delay line storage depends on the output
/// rate and is sized on the first block the effect processes.
pub fn create_effect(kind: EffectKind) -> Box<dyn Effect> {
    match kind {
        EffectKind::Gain { db } => Box::new(Gain::new(db)),
        EffectKind::Delay { seconds } => Box::new(Delay::new(seconds)),
        EffectKind::Reverb { delay, decay } => Box::new(Reverb::new(delay, decay)),
        EffectKind::PitchScale { ratio } => Box::new(PitchScale::new(ratio)),
        EffectKind::LowPass { cutoff } => Box::new(OnePole::low_pass(cutoff)),
        EffectKind::HighPass { cutoff } => Box::new(OnePole::high_pass(cutoff)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_effect_matches_kind() {
        let cases = [
            (EffectKind::Gain { db: -3.0 }, "Gain", -3.0),
            (EffectKind::Delay { seconds: 0.25 }, "Delay", 0.25),
            (EffectKind::Reverb { delay: 0.1, decay: 0.4 }, "Reverb", 0.1),
            (EffectKind::PitchScale { ratio: 1.5 }, "Pitch Scale", 1.5),
            (EffectKind::LowPass { cutoff: 800.0 }, "Low Pass", 800.0),
            (EffectKind::HighPass { cutoff: 200.0 }, "High Pass", 200.0),
        ];
        for (kind, name, first_param) in cases {
            let effect = create_effect(kind);
            assert_eq!(effect.info().name, name);
            assert_eq!(effect.param(0), Some(first_param));
        }
    }
}
