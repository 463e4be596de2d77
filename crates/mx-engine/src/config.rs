//! Mixer configuration.

use serde::{Deserialize, Serialize};

/// Output format and queue sizing for a [`Mixer`](crate::Mixer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count (1, 2, 4 or 6).
    pub channels: u16,
    /// Frames rendered per tick by the controller.
    pub buffer_frames: u32,
    /// Capacity of the mixer event queue.
    pub event_capacity: usize,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_frames: 512,
            event_capacity: 256,
        }
    }
}

impl MixerConfig {
    /// Wall-clock length of one buffer in seconds.
    pub fn buffer_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.buffer_frames as f64 / self.sample_rate as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_stereo_cd_rate() {
        let config = MixerConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, 2);
        assert!((config.buffer_seconds() - 512.0 / 44100.0).abs() < 1e-12);
    }
}
