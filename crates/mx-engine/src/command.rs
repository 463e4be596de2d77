//! Graph mutation commands and the buffers that batch them.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use arrayvec::ArrayString;
use mx_core::{Handle, SoundData};

use crate::effect::Effect;
use crate::effects::{create_effect, EffectKind};

/// Plain-data update applied to a processor in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProcessorUpdate {
    SetParam { param: u16, value: f32 },
    SetEnabled(bool),
    /// Clear the effect's signal history.
    Reset,
}

/// One graph mutation or playback action, executed on the render thread.
pub enum Command {
    InitBus { bus: Handle },
    SetBusOutput { bus: Handle, output: Option<Handle> },
    AddProcessor { bus: Handle, processor: Handle },
    RemoveProcessor { bus: Handle, processor: Handle },
    SetMasterBus { bus: Option<Handle> },
    InitData { data: Handle, source: Box<dyn SoundData> },
    InitStream { stream: Handle, data: Handle },
    PlayStream { stream: Handle, repeat: bool },
    StopStream { stream: Handle, reset: bool },
    SetStreamOutput { stream: Handle, bus: Option<Handle> },
    InitProcessor { processor: Handle, effect: Box<dyn Effect> },
    UpdateProcessor { processor: Handle, update: ProcessorUpdate },
    DeleteObject { object: Handle },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::InitBus { bus } => write!(f, "InitBus({})", bus),
            Command::SetBusOutput { bus, output } => {
                write!(f, "SetBusOutput({}, {:?})", bus, output.map(Handle::get))
            }
            Command::AddProcessor { bus, processor } => {
                write!(f, "AddProcessor({}, {})", bus, processor)
            }
            Command::RemoveProcessor { bus, processor } => {
                write!(f, "RemoveProcessor({}, {})", bus, processor)
            }
            Command::SetMasterBus { bus } => write!(f, "SetMasterBus({:?})", bus.map(Handle::get)),
            Command::InitData { data, source } => write!(
                f,
                "InitData({}, {} ch @ {} Hz)",
                data,
                source.channels(),
                source.sample_rate()
            ),
            Command::InitStream { stream, data } => write!(f, "InitStream({}, {})", stream, data),
            Command::PlayStream { stream, repeat } => {
                write!(f, "PlayStream({}, repeat={})", stream, repeat)
            }
            Command::StopStream { stream, reset } => {
                write!(f, "StopStream({}, reset={})", stream, reset)
            }
            Command::SetStreamOutput { stream, bus } => {
                write!(f, "SetStreamOutput({}, {:?})", stream, bus.map(Handle::get))
            }
            Command::InitProcessor { processor, effect } => {
                write!(f, "InitProcessor({}, {})", processor, effect.info().name)
            }
            Command::UpdateProcessor { processor, update } => {
                write!(f, "UpdateProcessor({}, {:?})", processor, update)
            }
            Command::DeleteObject { object } => write!(f, "DeleteObject({})", object),
        }
    }
}

/// An ordered batch of commands built by one producer call.
///
/// The mixer executes a buffer's commands contiguously and in order.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    name: ArrayString<32>,
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with a debug name (truncated to 32 bytes).
    pub fn named(name: &str) -> Self {
        let mut buffer = Self::default();
        let mut end = name.len().min(buffer.name.capacity());
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        let _ = buffer.name.try_push_str(&name[..end]);
        buffer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    // --- Buses ---

    pub fn init_bus(&mut self, bus: Handle) -> &mut Self {
        self.push(Command::InitBus { bus })
    }

    pub fn set_bus_output(&mut self, bus: Handle, output: Option<Handle>) -> &mut Self {
        self.push(Command::SetBusOutput { bus, output })
    }

    pub fn add_processor(&mut self, bus: Handle, processor: Handle) -> &mut Self {
        self.push(Command::AddProcessor { bus, processor })
    }

    pub fn remove_processor(&mut self, bus: Handle, processor: Handle) -> &mut Self {
        self.push(Command::RemoveProcessor { bus, processor })
    }

    pub fn set_master_bus(&mut self, bus: Option<Handle>) -> &mut Self {
        self.push(Command::SetMasterBus { bus })
    }

    // --- Sources ---

    pub fn init_data(&mut self, data: Handle, source: impl SoundData + 'static) -> &mut Self {
        self.push(Command::InitData { data, source: Box::new(source) })
    }

    pub fn init_stream(&mut self, stream: Handle, data: Handle) -> &mut Self {
        self.push(Command::InitStream { stream, data })
    }

    pub fn play_stream(&mut self, stream: Handle, repeat: bool) -> &mut Self {
        self.push(Command::PlayStream { stream, repeat })
    }

    pub fn stop_stream(&mut self, stream: Handle, reset: bool) -> &mut Self {
        self.push(Command::StopStream { stream, reset })
    }

    pub fn set_stream_output(&mut self, stream: Handle, bus: Option<Handle>) -> &mut Self {
        self.push(Command::SetStreamOutput { stream, bus })
    }

    // --- Processors ---

    pub fn init_processor(&mut self, processor: Handle, kind: EffectKind) -> &mut Self {
        self.push(Command::InitProcessor { processor, effect: create_effect(kind) })
    }

    pub fn set_processor_param(&mut self, processor: Handle, param: u16, value: f32) -> &mut Self {
        self.push(Command::UpdateProcessor {
            processor,
            update: ProcessorUpdate::SetParam { param, value },
        })
    }

    pub fn set_processor_enabled(&mut self, processor: Handle, enabled: bool) -> &mut Self {
        self.push(Command::UpdateProcessor {
            processor,
            update: ProcessorUpdate::SetEnabled(enabled),
        })
    }

    pub fn reset_processor(&mut self, processor: Handle) -> &mut Self {
        self.push(Command::UpdateProcessor { processor, update: ProcessorUpdate::Reset })
    }

    pub fn delete_object(&mut self, object: Handle) -> &mut Self {
        self.push(Command::DeleteObject { object })
    }

    pub(crate) fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}
