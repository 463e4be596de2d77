//! Mixing bus node.

use alloc::vec::Vec;

use mx_core::{AudioBuffer, Handle};

/// Sums its input buses and streams, then applies an optional processor.
///
/// Edges are stored as handles on both ends: a bus lists its inputs and each
/// input records its output. The mixer keeps the two sides in step.
#[derive(Debug, Default)]
pub struct Bus {
    pub(crate) output: Option<Handle>,
    pub(crate) processor: Option<Handle>,
    pub(crate) input_buses: Vec<Handle>,
    pub(crate) input_streams: Vec<Handle>,
    /// Render target, reused every tick.
    pub(crate) mix: AudioBuffer,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> Option<Handle> {
        self.output
    }

    pub fn processor(&self) -> Option<Handle> {
        self.processor
    }

    pub fn input_buses(&self) -> &[Handle] {
        &self.input_buses
    }

    pub fn input_streams(&self) -> &[Handle] {
        &self.input_streams
    }

    /// Samples produced by the most recent render.
    pub fn mix(&self) -> &AudioBuffer {
        &self.mix
    }

    pub(crate) fn add_input_bus(&mut self, bus: Handle) {
        insert_unique(&mut self.input_buses, bus);
    }

    pub(crate) fn remove_input_bus(&mut self, bus: Handle) {
        self.input_buses.retain(|&h| h != bus);
    }

    pub(crate) fn add_input_stream(&mut self, stream: Handle) {
        insert_unique(&mut self.input_streams, stream);
    }

    pub(crate) fn remove_input_stream(&mut self, stream: Handle) {
        self.input_streams.retain(|&h| h != stream);
    }
}

fn insert_unique(set: &mut Vec<Handle>, handle: Handle) {
    if !set.contains(&handle) {
        set.push(handle);
    }
}
