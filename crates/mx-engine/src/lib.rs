//! Render graph for the mixbus engine.
//!
//! Producers allocate handles and submit [`CommandBuffer`]s through a
//! [`MixerProducer`]; the thread that owns the [`Mixer`] drains them once per
//! tick with [`Mixer::process`] and pulls audio with [`Mixer::get_samples`].

extern crate alloc;

mod bus;
mod command;
mod command_queue;
mod config;
mod effect;
pub mod effects;
mod error;
mod event;
mod mixer;
mod object_table;
mod processor;
pub mod stft;
mod stream;

pub use bus::Bus;
pub use command::{Command, CommandBuffer, ProcessorUpdate};
pub use command_queue::CommandQueue;
pub use config::MixerConfig;
pub use effect::{Effect, EffectInfo, ParamInfo};
pub use effects::{create_effect, EffectKind};
pub use error::{MixerError, ObjectKind};
pub use event::{EventReceiver, MixerEvent};
pub use mixer::{Mixer, MixerProducer};
pub use object_table::{HandleAllocator, Object, ObjectTable, SharedAllocator};
pub use processor::ProcessorNode;
pub use stream::{DataNode, StreamNode};

// Re-export so callers rarely need mx-core directly.
pub use mx_core::{Handle, OscillatorData, PcmData, SoundData, SoundStream, Waveform};
