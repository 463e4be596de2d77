//! Fixed-coefficient channel up/down-mixing between speaker layouts.
//!
//! Buffers are planar: channel `ch` of frame `f` lives at `ch * frames + f`.
//! Channel order per layout:
//!
//! | channels | order |
//! |---|---|
//! | 1 | M |
//! | 2 | L R |
//! | 4 | L R SL SR |
//! | 6 | L R C LFE SL SR |

use thiserror::Error;

/// -3 dB, used when folding center and surround channels into the front pair.
const MINUS_3DB: f32 = 0.7071;

/// A supported speaker layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Mono,
    Stereo,
    Quad,
    Surround51,
}

impl Layout {
    /// Layout for a channel count, if supported.
    pub fn from_channels(channels: u16) -> Option<Self> {
        match channels {
            1 => Some(Layout::Mono),
            2 => Some(Layout::Stereo),
            4 => Some(Layout::Quad),
            6 => Some(Layout::Surround51),
            _ => None,
        }
    }

    /// Number of channels in this layout.
    pub fn channels(self) -> u16 {
        match self {
            Layout::Mono => 1,
            Layout::Stereo => 2,
            Layout::Quad => 4,
            Layout::Surround51 => 6,
        }
    }
}

/// Error for channel-count pairs outside the supported layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("unsupported channel conversion {from} -> {to}")]
    Unsupported { from: u16, to: u16 },
}

/// Convert planar `src` with `src_channels` into planar `dst` with
/// `dst_channels`, both `frames` long.
///
/// Equal counts copy unchanged. Counts outside 1/2/4/6 are rejected.
///
/// # Panics
/// If either slice is shorter than its declared dimensions.
pub fn convert_channels(
    frames: u32,
    src_channels: u16,
    src: &[f32],
    dst_channels: u16,
    dst: &mut [f32],
) -> Result<(), ChannelError> {
    let unsupported = ChannelError::Unsupported { from: src_channels, to: dst_channels };
    let from = Layout::from_channels(src_channels).ok_or(unsupported)?;
    let to = Layout::from_channels(dst_channels).ok_or(unsupported)?;

    let n = frames as usize;
    let src = &src[..src_channels as usize * n];
    let dst = &mut dst[..dst_channels as usize * n];

    if from == to {
        dst.copy_from_slice(src);
        return Ok(());
    }

    let s = |ch: usize, f: usize| src[ch * n + f];

    for f in 0..n {
        match (from, to) {
            (Layout::Mono, Layout::Stereo) => {
                dst[f] = s(0, f);
                dst[n + f] = s(0, f);
            }
            (Layout::Mono, Layout::Quad) => {
                dst[f] = s(0, f);
                dst[n + f] = s(0, f);
                dst[2 * n + f] = 0.0;
                dst[3 * n + f] = 0.0;
            }
            (Layout::Mono, Layout::Surround51) => {
                for ch in 0..6 {
                    dst[ch * n + f] = 0.0;
                }
                dst[2 * n + f] = s(0, f); // C = M
            }
            (Layout::Stereo, Layout::Mono) => {
                dst[f] = (s(0, f) + s(1, f)) * 0.5;
            }
            (Layout::Stereo, Layout::Quad) => {
                dst[f] = s(0, f);
                dst[n + f] = s(1, f);
                dst[2 * n + f] = 0.0;
                dst[3 * n + f] = 0.0;
            }
            (Layout::Stereo, Layout::Surround51) => {
                dst[f] = s(0, f);
                dst[n + f] = s(1, f);
                for ch in 2..6 {
                    dst[ch * n + f] = 0.0;
                }
            }
            (Layout::Quad, Layout::Mono) => {
                dst[f] = (s(0, f) + s(1, f) + s(2, f) + s(3, f)) * 0.25;
            }
            (Layout::Quad, Layout::Stereo) => {
                dst[f] = (s(0, f) + s(2, f)) * 0.5;
                dst[n + f] = (s(1, f) + s(3, f)) * 0.5;
            }
            (Layout::Quad, Layout::Surround51) => {
                dst[f] = s(0, f);
                dst[n + f] = s(1, f);
                dst[2 * n + f] = 0.0;
                dst[3 * n + f] = 0.0;
                dst[4 * n + f] = s(2, f);
                dst[5 * n + f] = s(3, f);
            }
            (Layout::Surround51, Layout::Mono) => {
                dst[f] = (s(0, f) + s(1, f)) * MINUS_3DB + s(2, f) + (s(4, f) + s(5, f)) * 0.5;
            }
            (Layout::Surround51, Layout::Stereo) => {
                dst[f] = s(0, f) + (s(2, f) + s(4, f)) * MINUS_3DB;
                dst[n + f] = s(1, f) + (s(2, f) + s(5, f)) * MINUS_3DB;
            }
            (Layout::Surround51, Layout::Quad) => {
                dst[f] = s(0, f) + s(2, f) * MINUS_3DB;
                dst[n + f] = s(1, f) + s(2, f) * MINUS_3DB;
                dst[2 * n + f] = s(4, f);
                dst[3 * n + f] = s(5, f);
            }
            (Layout::Mono, Layout::Mono)
            | (Layout::Stereo, Layout::Stereo)
            | (Layout::Quad, Layout::Quad)
            | (Layout::Surround51, Layout::Surround51) => unreachable!("handled above"),
        }
    }

    Ok(())
}
