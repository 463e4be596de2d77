//! Render-path benchmarks.
//!
//! One tick = 512 stereo frames at 44.1 kHz (~11.6 ms of audio).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mx_engine::{CommandBuffer, EffectKind, Mixer, MixerConfig, OscillatorData, Waveform};

const FRAMES: u32 = 512;

/// A master bus fed by `voices` oscillators at mixed native rates, with an
/// optional effect on the master.
fn build_mixer(voices: usize, effect: Option<EffectKind>) -> Mixer {
    let mut mixer = Mixer::new(MixerConfig::default());
    let producer = mixer.producer();
    let master = producer.allocate();

    let mut buffer = CommandBuffer::named("bench scene");
    buffer.init_bus(master).set_master_bus(Some(master));
    if let Some(kind) = effect {
        let fx = producer.allocate();
        buffer.init_processor(fx, kind).add_processor(master, fx);
    }
    for i in 0..voices {
        let data = producer.allocate();
        let stream = producer.allocate();
        let rate = if i % 2 == 0 { 44100 } else { 48000 };
        let osc = OscillatorData::new(110.0 * (i + 1) as f32, Waveform::Sine, 0.1, 0.0)
            .with_sample_rate(rate);
        buffer
            .init_data(data, osc)
            .init_stream(stream, data)
            .set_stream_output(stream, Some(master))
            .play_stream(stream, true);
    }
    producer.submit(buffer);
    mixer.process();
    mixer
}

fn bench_mixer(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer_tick");
    let mut out = Vec::with_capacity(FRAMES as usize * 2);

    for voices in [1usize, 8, 32] {
        let mut mixer = build_mixer(voices, None);
        group.bench_function(format!("{}_voices", voices), |b| {
            b.iter(|| {
                mixer.process();
                mixer.get_samples(FRAMES, 2, 44100, &mut out);
                black_box(&out);
            });
        });
    }

    let effects = [
        ("reverb", EffectKind::Reverb { delay: 0.1, decay: 0.5 }),
        ("pitch_scale", EffectKind::PitchScale { ratio: 1.5 }),
        ("low_pass", EffectKind::LowPass { cutoff: 1000.0 }),
    ];
    for (name, kind) in effects {
        let mut mixer = build_mixer(8, Some(kind));
        group.bench_function(format!("8_voices_{}", name), |b| {
            b.iter(|| {
                mixer.process();
                mixer.get_samples(FRAMES, 2, 44100, &mut out);
                black_box(&out);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mixer);
criterion_main!(benches);
