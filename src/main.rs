// famicore - NES emulator entry point
//
// Usage: famicore <rom-path>
//
// Startup failures (bad ROM, unsupported mapper, device init) exit non-zero;
// once the window is up, closing it is the clean-shutdown path that flushes
// battery saves.

use famicore::display;
use famicore::emulator::{EmulatorConfig, Nes, CONFIG_FILE};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Some(rom_path) = std::env::args().nth(1) else {
        eprintln!("usage: famicore <rom-path>");
        return ExitCode::FAILURE;
    };

    let config = EmulatorConfig::load_or_default(CONFIG_FILE);

    let mut nes = match Nes::from_file(&rom_path) {
        Ok(nes) => nes,
        Err(err) => {
            eprintln!("famicore: {}", err);
            return ExitCode::FAILURE;
        }
    };

    // The audio stream owns the ring's read end; it keeps playing whatever
    // the APU produces until the window closes and the stream drops.
    #[cfg(feature = "audio")]
    let _audio = if config.audio.enabled {
        match famicore::audio::AudioOutput::new(
            nes.take_audio().expect("audio consumer"),
            config.audio.volume,
        ) {
            Ok(output) => Some(output),
            Err(err) => {
                eprintln!("famicore: {}", err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    info!("starting {}", rom_path);
    match display::run(nes, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("famicore: {}", err);
            ExitCode::FAILURE
        }
    }
}
