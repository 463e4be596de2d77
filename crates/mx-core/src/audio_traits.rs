//! Source-provider traits: immutable sound content and its playback streams.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Immutable description of sound content.
///
/// A decoder (or a generator such as an oscillator) implements this and hands
/// it to the mixer through an `InitData` command. Streams created from it
/// must stay valid after the data object itself is dropped.
pub trait SoundData: Send {
    /// Native channel count of the content.
    fn channels(&self) -> u16;

    /// Native sample rate of the content in Hz.
    fn sample_rate(&self) -> u32;

    /// Create an independent playback cursor positioned at the start.
    fn create_stream(&self) -> Box<dyn SoundStream>;
}

/// One playback cursor over some [`SoundData`].
pub trait SoundStream: Send {
    /// Read up to `frames` frames at the native layout.
    ///
    /// `samples` is resized to `frames * channels` and filled planar with a
    /// channel stride of `frames`. Returns the number of leading frames that
    /// hold content; a value below `frames` means the end of the content was
    /// reached and the remaining frames are zero.
    fn fetch(&mut self, frames: u32, samples: &mut Vec<f32>) -> u32;

    /// `true` once the cursor sits at the end of the content, so the next
    /// `fetch` would return 0. Endless content never finishes.
    fn is_finished(&self) -> bool {
        false
    }

    /// Rewind to the start of the content.
    fn reset(&mut self);
}
