//! Headless controller for the mixbus engine.
//!
//! Owns a [`Mixer`], runs it on a dedicated render thread or renders it
//! offline, and encodes the result as WAV. Shared by the CLI and tests.

mod scene;
mod wav;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

// Re-export common types so callers don't need mx-engine directly.
pub use mx_engine::{
    CommandBuffer, EffectKind, EventReceiver, Handle, Mixer, MixerConfig, MixerError,
    MixerEvent, MixerProducer, OscillatorData, PcmData, Waveform,
};

pub use scene::{load_scene, BusConfig, SceneConfig, SceneHandles, VoiceConfig, WaveformConfig};
pub use wav::{samples_to_wav, write_wav};

#[derive(Debug, Error)]
pub enum MasterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scene: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("unknown bus '{0}'")]
    UnknownBus(String),
    #[error("bus '{0}' defined more than once")]
    DuplicateBus(String),
    #[error("render thread already running")]
    AlreadyRunning,
    #[error("render thread not running")]
    NotRunning,
    #[error("render thread panicked; mixer lost")]
    RenderPanicked,
    #[error(transparent)]
    Mixer(#[from] MixerError),
}

/// Headless mixer controller.
///
/// The mixer lives in a shared slot. While the render thread runs it takes
/// the mixer out of the slot and puts it back when it exits.
pub struct Controller {
    config: MixerConfig,
    producer: MixerProducer,
    mixer: Arc<Mutex<Option<Mixer>>>,
    events: Option<EventReceiver>,
    ticks: Arc<AtomicU64>,
    render: Option<RenderHandle>,
}

struct RenderHandle {
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<(), MixerError>>>,
}

impl Controller {
    pub fn new(config: MixerConfig) -> Self {
        let mut mixer = Mixer::new(config.clone());
        let producer = mixer.producer();
        let events = mixer.take_events();
        Self {
            config,
            producer,
            mixer: Arc::new(Mutex::new(Some(mixer))),
            events,
            ticks: Arc::new(AtomicU64::new(0)),
            render: None,
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    /// A producer for submitting commands from any thread.
    pub fn producer(&self) -> MixerProducer {
        self.producer.clone()
    }

    /// Take the mixer event consumer. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }

    /// Ticks rendered by the render thread since the controller was created.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    // --- Real-time rendering ---

    /// Start the render thread, discarding the rendered audio.
    pub fn start(&mut self) -> Result<(), MasterError> {
        self.start_with_sink(|_| {})
    }

    /// Start the render thread. `sink` receives every tick's planar output.
    pub fn start_with_sink<F>(&mut self, sink: F) -> Result<(), MasterError>
    where
        F: FnMut(&[f32]) + Send + 'static,
    {
        if self.render.is_some() {
            return Err(MasterError::AlreadyRunning);
        }
        if self.mixer.lock().is_none() {
            return Err(MasterError::RenderPanicked);
        }

        let stop_signal = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let slot = Arc::clone(&self.mixer);
        let stop = Arc::clone(&stop_signal);
        let done = Arc::clone(&finished);
        let ticks = Arc::clone(&self.ticks);
        let config = self.config.clone();

        let thread = std::thread::Builder::new()
            .name("mixbus-render".to_string())
            .spawn(move || render_thread(slot, config, sink, stop, ticks, done))?;

        log::info!(
            "render thread started: {} Hz, {} channels, {} frames per tick",
            self.config.sample_rate,
            self.config.channels,
            self.config.buffer_frames
        );
        self.render = Some(RenderHandle {
            stop_signal,
            finished,
            thread: Some(thread),
        });
        Ok(())
    }

    /// Stop the render thread and take the mixer back.
    ///
    /// Returns the error that ended the thread early, if any.
    pub fn stop(&mut self) -> Result<(), MasterError> {
        let mut render = self.render.take().ok_or(MasterError::NotRunning)?;
        render.stop_signal.store(true, Ordering::Relaxed);
        let Some(thread) = render.thread.take() else {
            return Ok(());
        };
        let result = match thread.join() {
            Ok(result) => result.map_err(MasterError::from),
            Err(_) => Err(MasterError::RenderPanicked),
        };
        log::info!("render thread stopped after {} ticks", self.ticks());
        result
    }

    /// `true` while the render thread is alive and has not hit an error.
    pub fn is_running(&self) -> bool {
        self.render
            .as_ref()
            .is_some_and(|r| !r.finished.load(Ordering::Relaxed))
    }

    // --- Offline rendering ---

    /// Render `frames` frames synchronously, one buffer-sized tick at a time.
    ///
    /// Queued commands are executed before every tick. The result is planar:
    /// `channels` planes of `frames` samples.
    pub fn render_offline(&mut self, frames: u32) -> Result<Vec<f32>, MasterError> {
        if self.render.is_some() {
            return Err(MasterError::AlreadyRunning);
        }
        let mut slot = self.mixer.lock();
        let mixer = slot.as_mut().ok_or(MasterError::RenderPanicked)?;

        let MixerConfig { sample_rate, channels, buffer_frames, .. } = self.config;
        let total = frames as usize;
        let mut out = vec![0.0f32; total * channels as usize];
        let mut tick = Vec::new();
        let mut offset = 0usize;

        while offset < total {
            let n = (total - offset).min(buffer_frames.max(1) as usize);
            mixer.try_process()?;
            mixer.try_get_samples(n as u32, channels, sample_rate, &mut tick)?;
            for ch in 0..channels as usize {
                out[ch * total + offset..ch * total + offset + n]
                    .copy_from_slice(&tick[ch * n..(ch + 1) * n]);
            }
            offset += n;
        }
        Ok(out)
    }

    /// Render `frames` frames offline and encode them as a WAV file.
    pub fn render_to_wav(&mut self, frames: u32) -> Result<Vec<u8>, MasterError> {
        let samples = self.render_offline(frames)?;
        Ok(wav::samples_to_wav(&samples, self.config.channels, self.config.sample_rate))
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(MixerConfig::default())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.render.is_some() {
            if let Err(err) = self.stop() {
                log::warn!("render thread ended with error: {}", err);
            }
        }
    }
}

fn render_thread<F>(
    slot: Arc<Mutex<Option<Mixer>>>,
    config: MixerConfig,
    mut sink: F,
    stop_signal: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
) -> Result<(), MixerError>
where
    F: FnMut(&[f32]),
{
    let Some(mut mixer) = slot.lock().take() else {
        finished.store(true, Ordering::Relaxed);
        return Ok(());
    };

    let period = Duration::from_secs_f64(config.buffer_seconds());
    let mut out = Vec::with_capacity(config.buffer_frames as usize * config.channels as usize);
    let mut result = Ok(());

    while !stop_signal.load(Ordering::Relaxed) {
        let started = Instant::now();
        let tick = mixer.try_process().and_then(|()| {
            mixer.try_get_samples(config.buffer_frames, config.channels, config.sample_rate, &mut out)
        });
        if let Err(err) = tick {
            log::error!("render thread stopping: {}", err);
            result = Err(err);
            break;
        }
        sink(&out);
        ticks.fetch_add(1, Ordering::Relaxed);

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    *slot.lock() = Some(mixer);
    finished.store(true, Ordering::Relaxed);
    result
}
