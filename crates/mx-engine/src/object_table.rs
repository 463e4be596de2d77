//! Handle-indexed ownership store for graph objects.

use alloc::collections::BTreeSet;
use alloc::sync::Arc;
use alloc::vec::Vec;

use mx_core::Handle;
use parking_lot::Mutex;

use crate::bus::Bus;
use crate::error::{MixerError, ObjectKind};
use crate::processor::ProcessorNode;
use crate::stream::{DataNode, StreamNode};

/// Hands out handles: the lowest released one first, otherwise a new one.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    last: u32,
    free: BTreeSet<u32>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle. Never returns 0.
    pub fn allocate(&mut self) -> Handle {
        let raw = match self.free.pop_first() {
            Some(raw) => raw,
            None => {
                self.last += 1;
                self.last
            }
        };
        Handle::from_index(raw as usize - 1)
    }

    /// Return a handle for reuse.
    pub fn release(&mut self, handle: Handle) -> Result<(), MixerError> {
        let raw = handle.get();
        if raw > self.last || !self.free.insert(raw) {
            return Err(MixerError::DoubleRelease(handle));
        }
        Ok(())
    }

    /// Number of handles currently handed out.
    pub fn live(&self) -> usize {
        self.last as usize - self.free.len()
    }
}

/// Allocator shared between producers and the render thread.
pub type SharedAllocator = Arc<Mutex<HandleAllocator>>;

/// Any object the mixer owns.
pub enum Object {
    Bus(Bus),
    Data(DataNode),
    Stream(StreamNode),
    Processor(ProcessorNode),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Bus(_) => ObjectKind::Bus,
            Object::Data(_) => ObjectKind::Data,
            Object::Stream(_) => ObjectKind::Stream,
            Object::Processor(_) => ObjectKind::Processor,
        }
    }
}

enum Slot {
    Empty,
    Live(Object),
    /// Bus temporarily moved out while it renders.
    Lent,
}

/// Owns every object; handle `h` lives in slot `h - 1`.
pub struct ObjectTable {
    slots: Vec<Slot>,
    allocator: SharedAllocator,
}

impl ObjectTable {
    pub fn new(allocator: SharedAllocator) -> Self {
        Self { slots: Vec::new(), allocator }
    }

    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Allocate a handle from the shared allocator.
    pub fn allocate(&self) -> Handle {
        self.allocator.lock().allocate()
    }

    /// Store `object` at `handle`, which must be empty.
    pub fn insert(&mut self, handle: Handle, object: Object) -> Result<(), MixerError> {
        let index = handle.index();
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || Slot::Empty);
        }
        match self.slots[index] {
            Slot::Empty => {
                self.slots[index] = Slot::Live(object);
                Ok(())
            }
            Slot::Live(_) | Slot::Lent => Err(MixerError::Occupied(handle)),
        }
    }

    /// Remove the object at `handle` and return the handle to the allocator.
    pub fn release(&mut self, handle: Handle) -> Result<Object, MixerError> {
        let slot = self
            .slots
            .get_mut(handle.index())
            .ok_or(MixerError::DoubleRelease(handle))?;
        match core::mem::replace(slot, Slot::Empty) {
            Slot::Live(object) => {
                self.allocator.lock().release(handle)?;
                Ok(object)
            }
            Slot::Empty => Err(MixerError::DoubleRelease(handle)),
            Slot::Lent => {
                *slot = Slot::Lent;
                Err(MixerError::Busy(handle))
            }
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&Object> {
        match self.slots.get(handle.index()) {
            Some(Slot::Live(object)) => Some(object),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Object> {
        match self.slots.get_mut(handle.index()) {
            Some(Slot::Live(object)) => Some(object),
            _ => None,
        }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| matches!(s, Slot::Live(_))).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live(&self, handle: Handle) -> Result<&Object, MixerError> {
        match self.slots.get(handle.index()) {
            Some(Slot::Live(object)) => Ok(object),
            Some(Slot::Lent) => Err(MixerError::Busy(handle)),
            _ => Err(MixerError::MissingObject(handle)),
        }
    }

    fn live_mut(&mut self, handle: Handle) -> Result<&mut Object, MixerError> {
        match self.slots.get_mut(handle.index()) {
            Some(Slot::Live(object)) => Ok(object),
            Some(Slot::Lent) => Err(MixerError::Busy(handle)),
            _ => Err(MixerError::MissingObject(handle)),
        }
    }

    pub fn bus(&self, handle: Handle) -> Result<&Bus, MixerError> {
        match self.live(handle)? {
            Object::Bus(bus) => Ok(bus),
            other => Err(wrong_kind(handle, ObjectKind::Bus, other)),
        }
    }

    pub fn bus_mut(&mut self, handle: Handle) -> Result<&mut Bus, MixerError> {
        match self.live_mut(handle)? {
            Object::Bus(bus) => Ok(bus),
            other => Err(wrong_kind(handle, ObjectKind::Bus, other)),
        }
    }

    pub fn data(&self, handle: Handle) -> Result<&DataNode, MixerError> {
        match self.live(handle)? {
            Object::Data(data) => Ok(data),
            other => Err(wrong_kind(handle, ObjectKind::Data, other)),
        }
    }

    pub fn stream(&self, handle: Handle) -> Result<&StreamNode, MixerError> {
        match self.live(handle)? {
            Object::Stream(stream) => Ok(stream),
            other => Err(wrong_kind(handle, ObjectKind::Stream, other)),
        }
    }

    pub fn stream_mut(&mut self, handle: Handle) -> Result<&mut StreamNode, MixerError> {
        match self.live_mut(handle)? {
            Object::Stream(stream) => Ok(stream),
            other => Err(wrong_kind(handle, ObjectKind::Stream, other)),
        }
    }

    pub fn processor(&self, handle: Handle) -> Result<&ProcessorNode, MixerError> {
        match self.live(handle)? {
            Object::Processor(processor) => Ok(processor),
            other => Err(wrong_kind(handle, ObjectKind::Processor, other)),
        }
    }

    pub fn processor_mut(&mut self, handle: Handle) -> Result<&mut ProcessorNode, MixerError> {
        match self.live_mut(handle)? {
            Object::Processor(processor) => Ok(processor),
            other => Err(wrong_kind(handle, ObjectKind::Processor, other)),
        }
    }

    /// Move a bus out of its slot for rendering, leaving it marked as lent.
    ///
    /// Reaching a lent bus again during the same render means the graph has a
    /// cycle; that surfaces as [`MixerError::Busy`].
    pub(crate) fn lend_bus(&mut self, handle: Handle) -> Result<Bus, MixerError> {
        self.bus(handle)?;
        match core::mem::replace(&mut self.slots[handle.index()], Slot::Lent) {
            Slot::Live(Object::Bus(bus)) => Ok(bus),
            _ => unreachable!("slot checked above"),
        }
    }

    /// Put back a bus taken with [`lend_bus`](Self::lend_bus).
    pub(crate) fn restore_bus(&mut self, handle: Handle, bus: Bus) {
        let slot = &mut self.slots[handle.index()];
        debug_assert!(matches!(slot, Slot::Lent));
        *slot = Slot::Live(Object::Bus(bus));
    }
}

fn wrong_kind(handle: Handle, expected: ObjectKind, actual: &Object) -> MixerError {
    MixerError::WrongKind { handle, expected, actual: actual.kind() }
}
