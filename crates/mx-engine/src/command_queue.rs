//! Cross-thread FIFO of command buffers.

use alloc::vec::Vec;
use core::mem;

use parking_lot::Mutex;

use crate::command::CommandBuffer;

/// Multi-producer queue of [`CommandBuffer`]s drained by the render thread.
///
/// The lock is held only for a push or a swap, never while commands execute.
#[derive(Default)]
pub struct CommandQueue {
    buffers: Mutex<Vec<CommandBuffer>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a buffer. Empty buffers are discarded.
    pub fn submit(&self, buffer: CommandBuffer) {
        if buffer.is_empty() {
            return;
        }
        self.buffers.lock().push(buffer);
    }

    /// Remove and return every buffer queued so far, oldest first.
    pub fn drain(&self) -> Vec<CommandBuffer> {
        mem::take(&mut *self.buffers.lock())
    }

    /// Swap queued buffers into `out`, which must be empty.
    ///
    /// Reusing `out` across ticks keeps the drain from allocating once the
    /// queue has reached its typical depth.
    pub fn drain_into(&self, out: &mut Vec<CommandBuffer>) {
        debug_assert!(out.is_empty());
        mem::swap(&mut *self.buffers.lock(), out);
    }

    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mx_core::Handle;
    use std::sync::Arc;
    use std::thread;

    fn h(raw: u32) -> Handle {
        Handle::new(raw).unwrap()
    }

    #[test]
    fn drain_is_fifo_and_empties_queue() {
        let queue = CommandQueue::new();
        queue.submit(CommandBuffer::named("first"));
        let mut a = CommandBuffer::named("a");
        a.init_bus(h(1));
        let mut b = CommandBuffer::named("b");
        b.init_bus(h(2)).set_master_bus(Some(h(2)));
        queue.submit(a);
        queue.submit(b);

        assert_eq!(queue.len(), 2, "empty buffer is discarded");
        let drained = queue.drain();
        let names: Vec<&str> = drained.iter().map(|b| b.name()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(drained[1].len(), 2);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn concurrent_producers_keep_buffers_whole() {
        let queue = Arc::new(CommandQueue::new());
        let producers: Vec<_> = (0..4u32)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..100u32 {
                        let base = t * 1000 + i * 3 + 1;
                        let mut buffer = CommandBuffer::new();
                        buffer.init_bus(h(base)).init_bus(h(base + 1)).init_bus(h(base + 2));
                        queue.submit(buffer);
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }

        let drained = queue.drain();
        assert_eq!(drained.len(), 400);
        for buffer in &drained {
            let raw: Vec<String> = buffer.commands().iter().map(|c| format!("{:?}", c)).collect();
            assert_eq!(raw.len(), 3);
            let first: u32 = raw[0][9..raw[0].len() - 1].parse().unwrap();
            assert_eq!(raw[1], format!("InitBus(#{})", first + 1));
            assert_eq!(raw[2], format!("InitBus(#{})", first + 2));
        }
    }
}
