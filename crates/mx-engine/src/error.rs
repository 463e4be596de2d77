//! Mixer error type.

use mx_core::{ChannelError, Handle};
use thiserror::Error;

/// What kind of object a handle slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Bus,
    Data,
    Stream,
    Processor,
}

impl core::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ObjectKind::Bus => "bus",
            ObjectKind::Data => "data",
            ObjectKind::Stream => "stream",
            ObjectKind::Processor => "processor",
        })
    }
}

/// Configuration errors raised while executing commands or rendering.
///
/// Every variant indicates a programming error on the producer side: the
/// command stream referenced something that does not exist or is malformed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MixerError {
    #[error("no object with handle {0}")]
    MissingObject(Handle),
    #[error("object {handle} is a {actual}, expected a {expected}")]
    WrongKind {
        handle: Handle,
        expected: ObjectKind,
        actual: ObjectKind,
    },
    #[error("object {0} is already being rendered (cycle in the bus graph?)")]
    Busy(Handle),
    #[error("slot for handle {0} is already occupied")]
    Occupied(Handle),
    #[error("handle {0} released twice")]
    DoubleRelease(Handle),
    #[error("processor {processor} has no parameter {param}")]
    UnknownParam { processor: Handle, param: u16 },
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u16),
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(u32),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
