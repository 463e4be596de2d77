//! Allocation-free render path tests.
//!
//! These tests verify that `Mixer::process()` + `Mixer::get_samples()` do
//! not allocate once every scratch buffer has grown to the tick size. Each
//! graph is warmed up for one tick, then rendered for several seconds.
//!
//! Just run `cargo test` — no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use mx_engine::{CommandBuffer, EffectKind, Mixer, OscillatorData, PcmData, Waveform};

const FRAMES: u32 = 512;
const RATE: u32 = 44100;

/// Render `ticks` ticks after one warm-up tick, aborting on any heap allocation.
fn assert_render_alloc_free(mut mixer: Mixer, channels: u16, ticks: usize) {
    let mut out = Vec::new();
    mixer.process();
    mixer.get_samples(FRAMES, channels, RATE, &mut out);

    assert_no_alloc(|| {
        for _ in 0..ticks {
            mixer.process();
            mixer.get_samples(FRAMES, channels, RATE, &mut out);
        }
    });
}

/// A master bus with `voices` oscillators at alternating native rates and
/// an optional effect on the master.
fn voice_graph(voices: usize, effect: Option<EffectKind>) -> Mixer {
    let mixer = Mixer::default();
    let producer = mixer.producer();
    let master = producer.allocate();
    let mut buffer = CommandBuffer::named("voices");
    buffer.init_bus(master).set_master_bus(Some(master));

    if let Some(kind) = effect {
        let processor = producer.allocate();
        buffer.init_processor(processor, kind).add_processor(master, processor);
    }

    let waves = [Waveform::Sine, Waveform::Square, Waveform::Sawtooth, Waveform::Triangle];
    for i in 0..voices {
        let data = producer.allocate();
        let stream = producer.allocate();
        let rate = if i % 2 == 0 { 44100 } else { 48000 };
        let osc = OscillatorData::new(110.0 * (i + 1) as f32, waves[i % 4], 0.1, 0.0)
            .with_sample_rate(rate);
        buffer
            .init_data(data, osc)
            .init_stream(stream, data)
            .set_stream_output(stream, Some(master))
            .play_stream(stream, false);
    }
    producer.submit(buffer);
    mixer
}

#[test]
fn oscillators_alloc_free() {
    assert_render_alloc_free(voice_graph(8, None), 2, RATE as usize * 5 / FRAMES as usize);
}

#[test]
fn surround_output_alloc_free() {
    assert_render_alloc_free(voice_graph(4, None), 6, 200);
}

#[test]
fn effects_alloc_free() {
    let effects = [
        EffectKind::Gain { db: -6.0 },
        EffectKind::Delay { seconds: 0.3 },
        EffectKind::Reverb { delay: 0.05, decay: 0.5 },
        EffectKind::PitchScale { ratio: 1.5 },
        EffectKind::LowPass { cutoff: 1000.0 },
        EffectKind::HighPass { cutoff: 200.0 },
    ];
    for effect in effects {
        assert_render_alloc_free(voice_graph(4, Some(effect)), 2, 200);
    }
}

#[test]
fn looping_pcm_through_nested_buses_alloc_free() {
    let mixer = Mixer::default();
    let producer = mixer.producer();
    let master = producer.allocate();
    let group = producer.allocate();
    let data = producer.allocate();
    let stream = producer.allocate();

    // 300 frames loops several times within one tick
    let content: Vec<f32> = (0..600).map(|i| (i as f32 * 0.01).sin()).collect();
    let mut buffer = CommandBuffer::new();
    buffer
        .init_bus(master)
        .init_bus(group)
        .set_bus_output(group, Some(master))
        .set_master_bus(Some(master))
        .init_data(data, PcmData::from_planar(2, 22050, content))
        .init_stream(stream, data)
        .set_stream_output(stream, Some(group))
        .play_stream(stream, true);
    producer.submit(buffer);

    assert_render_alloc_free(mixer, 2, 400);
}
