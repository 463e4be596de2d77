//! Stream state notifications from the render thread.

use mx_core::Handle;
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// A stream changed state while commands executed or audio rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixerEvent {
    StreamStarted { stream: Handle },
    StreamStopped { stream: Handle },
    StreamReset { stream: Handle },
    /// A non-repeating stream reached the end of its content.
    StreamFinished { stream: Handle },
}

/// Consumer side of the event queue, handed out by [`Mixer::take_events`](crate::Mixer::take_events).
pub type EventReceiver = HeapCons<MixerEvent>;

/// Render-thread side of the bounded event queue.
pub(crate) struct EventSender {
    producer: HeapProd<MixerEvent>,
    dropped: u64,
}

impl EventSender {
    pub(crate) fn channel(capacity: usize) -> (Self, EventReceiver) {
        let (producer, consumer) = HeapRb::<MixerEvent>::new(capacity.max(1)).split();
        (Self { producer, dropped: 0 }, consumer)
    }

    /// Queue an event, dropping it if the consumer has fallen behind.
    pub(crate) fn send(&mut self, event: MixerEvent) {
        if self.producer.try_push(event).is_err() {
            self.dropped += 1;
            log::warn!("event queue full, dropped {:?} ({} total)", event, self.dropped);
        }
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Consumer;

    #[test]
    fn full_queue_drops_newest() {
        let stream = Handle::new(1).unwrap();
        let (mut tx, mut rx) = EventSender::channel(2);
        tx.send(MixerEvent::StreamStarted { stream });
        tx.send(MixerEvent::StreamStopped { stream });
        tx.send(MixerEvent::StreamReset { stream });
        assert_eq!(tx.dropped(), 1);

        assert_eq!(rx.try_pop(), Some(MixerEvent::StreamStarted { stream }));
        assert_eq!(rx.try_pop(), Some(MixerEvent::StreamStopped { stream }));
        assert_eq!(rx.try_pop(), None);
    }
}
