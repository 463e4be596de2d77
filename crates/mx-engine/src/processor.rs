//! Processor node: an effect instance plus its attachment state.

use alloc::boxed::Box;

use mx_core::Handle;

use crate::command::ProcessorUpdate;
use crate::effect::Effect;
use crate::error::MixerError;

pub struct ProcessorNode {
    effect: Box<dyn Effect>,
    enabled: bool,
    /// Bus this processor is attached to.
    pub(crate) bus: Option<Handle>,
}

impl ProcessorNode {
    pub fn new(effect: Box<dyn Effect>) -> Self {
        Self { effect, enabled: true, bus: None }
    }

    pub fn effect(&self) -> &dyn Effect {
        self.effect.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn bus(&self) -> Option<Handle> {
        self.bus
    }

    /// Apply a plain-data update. `handle` is only used for error reporting.
    pub(crate) fn update(&mut self, handle: Handle, update: ProcessorUpdate) -> Result<(), MixerError> {
        match update {
            ProcessorUpdate::SetParam { param, value } => {
                if !self.effect.set_param(param, value) {
                    return Err(MixerError::UnknownParam { processor: handle, param });
                }
            }
            ProcessorUpdate::SetEnabled(enabled) => self.enabled = enabled,
            ProcessorUpdate::Reset => self.effect.reset(),
        }
        Ok(())
    }

    /// Run the effect over a planar block if enabled.
    pub(crate) fn process(&mut self, frames: u32, channels: u16, sample_rate: u32, samples: &mut [f32]) {
        if self.enabled {
            self.effect.process(frames, channels, sample_rate, samples);
        }
    }
}
