//! `pcm-play` command-line surface.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;

use pcm_playback_core::models::config::PlaybackConfiguration;
use pcm_playback_core::models::error::PlaybackError;
use pcm_playback_core::models::playback_result::PlaybackReport;
use pcm_playback_core::session::controller::PlaybackController;
use pcm_playback_core::traits::playback_device::AudioBackend;
use pcm_playback_core::SimulatedBackend;

/// Exit code for usage errors and unreadable input files.
pub const EXIT_USAGE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "pcm-play")]
#[command(about = "Play a 16-bit PCM WAV file through an audio output device")]
#[command(version)]
pub struct Args {
    /// WAV file: 44-byte header followed directly by interleaved PCM samples
    #[arg(required_unless_present = "list_devices")]
    pub file: Option<PathBuf>,

    /// Playback device identifier
    #[arg(short, long, default_value = "default", env = "PCM_PLAY_DEVICE")]
    pub device: String,

    /// Periods written per transfer chunk
    #[arg(short, long, default_value_t = 2)]
    pub periods: u32,

    /// Write a JSON playback report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Play into an in-process simulated device instead of audio hardware
    #[arg(long)]
    pub simulate: bool,

    /// List playback devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

impl Args {
    pub fn configuration(&self) -> PlaybackConfiguration {
        PlaybackConfiguration {
            device_id: self.device.clone(),
            periods_per_buffer: self.periods,
            report_path: self.report.clone(),
        }
    }
}

/// Run the player and return the process exit code.
pub fn run(args: Args, interrupt: Arc<AtomicBool>) -> u8 {
    if args.list_devices {
        return list_devices();
    }

    let Some(path) = args.file.clone() else {
        eprintln!("ERROR: no input file given");
        return EXIT_USAGE;
    };

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("ERROR: {} does not exist, or cannot be opened: {}", path.display(), e);
            return EXIT_USAGE;
        }
    };

    let config = args.configuration();
    let label = path.display().to_string();
    let result = if args.simulate {
        log::info!("Playing {} into the simulated device", label);
        play(SimulatedBackend::default(), config, file, label, interrupt)
    } else {
        play_hardware(config, file, label, interrupt)
    };

    match result {
        Ok(report) => {
            let suffix = if report.interrupted { " (interrupted)" } else { "" };
            println!(
                "Played {:.2}s: {} frames in {} chunks, {} underruns{}",
                report.played_secs,
                report.stats.frames_written,
                report.stats.chunks_written,
                report.stats.underruns,
                suffix
            );
            0
        }
        Err(e) => {
            eprintln!("ERROR: {} failed: {}", e.stage_name(), e);
            e.exit_code()
        }
    }
}

fn play<B: AudioBackend, R: Read>(
    backend: B,
    config: PlaybackConfiguration,
    source: R,
    label: String,
    interrupt: Arc<AtomicBool>,
) -> Result<PlaybackReport, PlaybackError> {
    let mut controller = PlaybackController::new(backend, config, source, label);
    controller.set_interrupt_flag(interrupt);
    controller.play()
}

#[cfg(all(target_os = "linux", feature = "alsa"))]
fn play_hardware<R: Read>(
    config: PlaybackConfiguration,
    source: R,
    label: String,
    interrupt: Arc<AtomicBool>,
) -> Result<PlaybackReport, PlaybackError> {
    play(crate::alsa_device::AlsaBackend, config, source, label, interrupt)
}

#[cfg(not(all(target_os = "linux", feature = "alsa")))]
fn play_hardware<R: Read>(
    _config: PlaybackConfiguration,
    _source: R,
    _label: String,
    _interrupt: Arc<AtomicBool>,
) -> Result<PlaybackReport, PlaybackError> {
    Err(PlaybackError::Configuration(
        "built without ALSA support; rebuild with `--features alsa` or pass --simulate".into(),
    ))
}

#[cfg(all(target_os = "linux", feature = "alsa"))]
fn list_devices() -> u8 {
    use crate::device_enumerator::DeviceEnumerator;

    match DeviceEnumerator::new().list_playback_devices() {
        Ok(devices) => {
            for device in devices {
                match device.description {
                    Some(desc) => println!("{:<40} {}", device.name, desc),
                    None => println!("{}", device.name),
                }
            }
            0
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            EXIT_USAGE
        }
    }
}

#[cfg(not(all(target_os = "linux", feature = "alsa")))]
fn list_devices() -> u8 {
    eprintln!("ERROR: built without ALSA support; no devices to list");
    EXIT_USAGE
}
