//! Core audio types for the mixbus engine.
//!
//! This crate holds everything the mixer operates on that is independent of
//! the render graph itself: object handles, the planar audio buffer, the
//! sound data/stream traits with their built-in providers, and the sample
//! math used on the render path (resampling and channel conversion).
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod audio_buffer;
mod audio_traits;
mod channel;
mod handle;
mod oscillator;
mod pcm;
mod resample;

pub use audio_buffer::{AudioBuffer, MAX_CHANNELS};
pub use audio_traits::{SoundData, SoundStream};
pub use channel::{convert_channels, ChannelError, Layout};
pub use handle::{raw as raw_handle, Handle};
pub use oscillator::{OscillatorData, OscillatorStream, Waveform, DEFAULT_OSCILLATOR_RATE};
pub use pcm::{PcmData, PcmStream};
pub use resample::{resample, source_frames};
