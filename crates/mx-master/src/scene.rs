//! YAML scene description: render settings, a bus tree and oscillator voices.
//!
//! ```yaml
//! mixer:
//!   sample_rate: 48000
//!   channels: 2
//! seconds: 2.0
//! master: main
//! buses:
//!   - name: main
//!     effect: { type: gain, db: -6.0 }
//!   - name: echo
//!     output: main
//!     effect: { type: delay, seconds: 0.25 }
//! voices:
//!   - bus: echo
//!     waveform: triangle
//!     frequency: 220.0
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use mx_engine::{CommandBuffer, EffectKind, Handle, MixerConfig, MixerProducer, OscillatorData, Waveform};
use serde::{Deserialize, Serialize};

use crate::MasterError;

/// Oscillator shape as written in a scene file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformConfig {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl From<WaveformConfig> for Waveform {
    fn from(w: WaveformConfig) -> Self {
        match w {
            WaveformConfig::Sine => Waveform::Sine,
            WaveformConfig::Square => Waveform::Square,
            WaveformConfig::Sawtooth => Waveform::Sawtooth,
            WaveformConfig::Triangle => Waveform::Triangle,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    pub name: String,
    /// Parent bus; `None` for the master or a detached bus.
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub effect: Option<EffectKind>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub bus: String,
    pub waveform: WaveformConfig,
    pub frequency: f32,
    pub amplitude: f32,
    /// Seconds; `0.0` plays forever.
    pub length: f32,
    /// Native rate of the generated content.
    pub sample_rate: u32,
    pub repeat: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            bus: "master".to_string(),
            waveform: WaveformConfig::Sine,
            frequency: 440.0,
            amplitude: 0.5,
            length: 0.0,
            sample_rate: mx_core::DEFAULT_OSCILLATOR_RATE,
            repeat: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub mixer: MixerConfig,
    /// Render length in seconds.
    pub seconds: f32,
    /// Name of the bus to use as master.
    pub master: String,
    pub buses: Vec<BusConfig>,
    pub voices: Vec<VoiceConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mixer: MixerConfig::default(),
            seconds: 2.0,
            master: "master".to_string(),
            buses: vec![BusConfig {
                name: "master".to_string(),
                output: None,
                effect: None,
            }],
            voices: vec![VoiceConfig::default()],
        }
    }
}

/// Handles allocated for a scene, by bus name and in voice order.
#[derive(Debug, Default)]
pub struct SceneHandles {
    pub buses: HashMap<String, Handle>,
    pub processors: HashMap<String, Handle>,
    pub streams: Vec<Handle>,
}

impl SceneConfig {
    /// Parse a scene from YAML text.
    pub fn parse(yaml: &str) -> Result<Self, MasterError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Total frames to render at the configured output rate.
    pub fn total_frames(&self) -> u32 {
        (self.seconds.max(0.0) as f64 * self.mixer.sample_rate as f64) as u32
    }

    /// Allocate handles and queue the commands that build this scene.
    ///
    /// Everything goes into one command buffer, so the whole scene appears
    /// at the same tick.
    pub fn submit(&self, producer: &MixerProducer) -> Result<SceneHandles, MasterError> {
        let mut names = HashSet::new();
        if let Some(dup) = self.buses.iter().find(|bus| !names.insert(bus.name.as_str())) {
            return Err(MasterError::DuplicateBus(dup.name.clone()));
        }

        let mut handles = SceneHandles::default();
        let mut buffer = CommandBuffer::named("scene");

        for bus in &self.buses {
            let handle = producer.allocate();
            buffer.init_bus(handle);
            handles.buses.insert(bus.name.clone(), handle);
        }

        let lookup = |name: &str| {
            handles
                .buses
                .get(name)
                .copied()
                .ok_or_else(|| MasterError::UnknownBus(name.to_string()))
        };

        for bus in &self.buses {
            let handle = lookup(&bus.name)?;
            if let Some(output) = &bus.output {
                buffer.set_bus_output(handle, Some(lookup(output)?));
            }
            if let Some(effect) = bus.effect {
                let processor = producer.allocate();
                buffer.init_processor(processor, effect).add_processor(handle, processor);
                handles.processors.insert(bus.name.clone(), processor);
            }
        }
        buffer.set_master_bus(Some(lookup(&self.master)?));

        for voice in &self.voices {
            let output = lookup(&voice.bus)?;
            let data = producer.allocate();
            let stream = producer.allocate();
            let source = OscillatorData::new(
                voice.frequency,
                voice.waveform.into(),
                voice.amplitude,
                voice.length,
            )
            .with_sample_rate(voice.sample_rate);
            buffer
                .init_data(data, source)
                .init_stream(stream, data)
                .set_stream_output(stream, Some(output))
                .play_stream(stream, voice.repeat);
            handles.streams.push(stream);
        }

        log::info!(
            "scene: {} buses, {} voices, {} commands",
            self.buses.len(),
            self.voices.len(),
            buffer.len()
        );
        producer.submit(buffer);
        Ok(handles)
    }
}

/// Load a scene from a YAML file.
///
/// A missing file yields the default scene. A file that exists but cannot be
/// read or parsed is an error.
pub fn load_scene(path: &Path) -> Result<SceneConfig, MasterError> {
    log::info!("load_scene: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_scene: Scene file doesn't exist, using defaults");
        return Ok(SceneConfig::default());
    }

    let contents = std::fs::read_to_string(path)?;
    let scene = SceneConfig::parse(&contents)?;
    log::info!(
        "load_scene: Loaded scene - {} Hz, {} channels, {:.2} s",
        scene.mixer.sample_rate,
        scene.mixer.channels,
        scene.seconds
    );
    Ok(scene)
}
