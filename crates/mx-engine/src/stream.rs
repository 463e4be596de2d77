//! Data and stream nodes.

use alloc::boxed::Box;
use alloc::vec::Vec;

use mx_core::{convert_channels, resample, source_frames, AudioBuffer, Handle, SoundData, SoundStream};

use crate::error::MixerError;

/// Immutable sound content stored in the object table.
pub struct DataNode {
    source: Box<dyn SoundData>,
}

impl DataNode {
    /// Wrap a source, rejecting layouts and rates the mixer cannot render.
    pub fn new(source: Box<dyn SoundData>) -> Result<Self, MixerError> {
        let channels = source.channels();
        if !matches!(channels, 1 | 2 | 4 | 6) {
            return Err(MixerError::UnsupportedChannels(channels));
        }
        if source.sample_rate() == 0 {
            return Err(MixerError::InvalidSampleRate(0));
        }
        Ok(Self { source })
    }

    pub fn channels(&self) -> u16 {
        self.source.channels()
    }

    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    pub(crate) fn create_stream(&self, data: Handle) -> StreamNode {
        StreamNode::new(data, self.source.channels(), self.source.sample_rate(), self.source.create_stream())
    }
}

/// One playback instance of a [`DataNode`].
pub struct StreamNode {
    stream: Box<dyn SoundStream>,
    data: Handle,
    channels: u16,
    sample_rate: u32,
    playing: bool,
    repeating: bool,
    pub(crate) output: Option<Handle>,

    /// Native-layout samples for the current tick, planar with stride `fetched_frames`.
    fetched: Vec<f32>,
    /// Raw block handed to [`SoundStream::fetch`].
    chunk: Vec<f32>,
    resampled: Vec<f32>,
    /// Converted output for the current tick.
    pub(crate) out: AudioBuffer,
}

/// What happened to a stream during one render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StreamStatus {
    Idle,
    Playing,
    /// Content ran out on a non-repeating stream.
    Finished,
}

impl StreamNode {
    fn new(data: Handle, channels: u16, sample_rate: u32, stream: Box<dyn SoundStream>) -> Self {
        Self {
            stream,
            data,
            channels,
            sample_rate,
            playing: false,
            repeating: false,
            output: None,
            fetched: Vec::new(),
            chunk: Vec::new(),
            resampled: Vec::new(),
            out: AudioBuffer::default(),
        }
    }

    pub fn data(&self) -> Handle {
        self.data
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_repeating(&self) -> bool {
        self.repeating
    }

    pub fn output(&self) -> Option<Handle> {
        self.output
    }

    pub(crate) fn play(&mut self, repeat: bool) {
        self.playing = true;
        self.repeating = repeat;
    }

    pub(crate) fn stop(&mut self, reset: bool) {
        self.playing = false;
        if reset {
            self.stream.reset();
        }
    }

    /// Render `frames` frames at the output format into `self.out`.
    ///
    /// A stream that is not playing renders silence.
    pub(crate) fn render(&mut self, frames: u32, channels: u16, sample_rate: u32) -> Result<StreamStatus, MixerError> {
        self.out.resize(channels, frames);
        if !self.playing || frames == 0 {
            return Ok(if self.playing { StreamStatus::Playing } else { StreamStatus::Idle });
        }

        let needed = if sample_rate == self.sample_rate {
            frames
        } else {
            source_frames(frames, self.sample_rate, sample_rate)
        };
        let finished = self.fill(needed);

        let native = if needed == frames {
            &self.fetched
        } else {
            self.resampled.clear();
            self.resampled.resize(self.channels as usize * frames as usize, 0.0);
            resample(self.channels, needed, &self.fetched, frames, &mut self.resampled);
            &self.resampled
        };

        convert_channels(frames, self.channels, native, channels, self.out.as_mut_slice())?;

        Ok(if finished {
            StreamStatus::Finished
        } else {
            StreamStatus::Playing
        })
    }

    /// Pull `needed` native frames into `self.fetched`, looping or stopping at
    /// the end of content. Returns true if the stream finished.
    fn fill(&mut self, needed: u32) -> bool {
        let chs = self.channels as usize;
        let stride = needed as usize;
        self.fetched.clear();
        self.fetched.resize(chs * stride, 0.0);

        let mut filled = 0usize;
        let mut rewound = false;
        while filled < stride {
            let remaining = stride - filled;
            let got = self.stream.fetch(remaining as u32, &mut self.chunk) as usize;

            for ch in 0..chs {
                let dst = ch * stride + filled;
                let src = ch * remaining;
                self.fetched[dst..dst + got].copy_from_slice(&self.chunk[src..src + got]);
            }
            filled += got;

            if got == remaining && !self.stream.is_finished() {
                continue;
            }
            if !self.repeating {
                // rewound so a later play starts from the top
                self.playing = false;
                self.stream.reset();
                return true;
            }
            if got == 0 && rewound {
                // empty content: nothing to loop over
                break;
            }
            self.stream.reset();
            rewound = true;
        }
        false
    }
}
