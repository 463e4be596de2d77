//! Opaque object handles.

use core::fmt;
use core::num::NonZeroU32;

/// Identifier of a live graph object (bus, data, stream or processor).
///
/// Handles are positive integers; the reserved value `0` ("no object") is
/// expressed as `Option<Handle>::None`, which costs no extra space thanks to
/// the `NonZeroU32` niche. Handle `h` lives in object-table slot `h - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(NonZeroU32);

impl Handle {
    /// Build a handle from its raw value. Returns `None` for `0`.
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Build the handle stored in the given zero-based slot.
    pub fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .expect("object table exceeds u32 handles");
        Self(raw)
    }

    /// Raw integer value (never zero).
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Zero-based slot index in the object table.
    pub const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw encoding of an optional handle, with `0` meaning "no object".
pub fn raw(handle: Option<Handle>) -> u32 {
    handle.map_or(0, Handle::get)
}
