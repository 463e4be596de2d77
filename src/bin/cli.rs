//! mixbus CLI: render a YAML scene to WAV, or run it live for its length.
//!
//! Usage:
//!   mx-cli [scene.yaml] --wav output.wav
//!   mx-cli [scene.yaml]
//!
//! A missing scene file renders the default scene (one 440 Hz sine).

use mx_master::{load_scene, Controller, SceneConfig};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use std::{env, fs};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let wav_index = args.iter().position(|a| a == "--wav");
    let wav_path = wav_index.and_then(|i| args.get(i + 1)).cloned();
    if wav_index.is_some() && wav_path.is_none() {
        eprintln!("Usage: mx-cli [scene.yaml] [--wav output.wav]");
        std::process::exit(1);
    }

    let scene_path = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|&(i, _)| wav_index.map_or(true, |w| i != w && i != w + 1))
        .map(|(_, a)| a.as_str())
        .unwrap_or("scene.yaml");

    let scene = load_scene(Path::new(scene_path)).unwrap_or_else(|e| {
        eprintln!("Failed to load {}: {}", scene_path, e);
        std::process::exit(1);
    });

    println!("Rate:     {} Hz", scene.mixer.sample_rate);
    println!("Channels: {}", scene.mixer.channels);
    println!("Buses:    {}", scene.buses.len());
    println!("Voices:   {}", scene.voices.len());
    println!("Length:   {:.2} s", scene.seconds);
    println!();

    let mut ctrl = Controller::new(scene.mixer.clone());
    scene.submit(&ctrl.producer()).unwrap_or_else(|e| {
        eprintln!("Failed to build scene: {}", e);
        std::process::exit(1);
    });

    match wav_path {
        Some(wav) => render_to_wav(&mut ctrl, &scene, &wav),
        None => play_live(&mut ctrl, &scene),
    }
}

fn play_live(ctrl: &mut Controller, scene: &SceneConfig) {
    ctrl.start().unwrap_or_else(|e| {
        eprintln!("Failed to start render thread: {}", e);
        std::process::exit(1);
    });
    println!("Rendering...");

    let length = Duration::from_secs_f32(scene.seconds.max(0.0));
    let started = Instant::now();
    while ctrl.is_running() && started.elapsed() < length {
        print!("\rTick: {:>8}", ctrl.ticks());
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(10));
    }

    if let Err(e) = ctrl.stop() {
        eprintln!("\nRender failed: {}", e);
        std::process::exit(1);
    }
    println!("\rDone.          ");
}

fn render_to_wav(ctrl: &mut Controller, scene: &SceneConfig, path: &str) {
    println!("Rendering to {} at {} Hz...", path, scene.mixer.sample_rate);

    let wav = ctrl.render_to_wav(scene.total_frames()).unwrap_or_else(|e| {
        eprintln!("Render failed: {}", e);
        std::process::exit(1);
    });
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        std::process::exit(1);
    });

    println!("Done.");
}
