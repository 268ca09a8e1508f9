//! # pcm-playback-alsa
//!
//! Linux ALSA backend and command-line front end for pcm-playback.
//!
//! Provides:
//! - `AlsaBackend` / `AlsaDevice`: blocking interleaved playback through an ALSA PCM
//! - `DeviceEnumerator`: playback PCM listing from ALSA name hints
//! - `cli`: the `pcm-play` argument surface and run loop
//!
//! ## Platform Requirements
//! - Linux with the ALSA development package (`libasound2-dev` / `alsa-lib-devel`)
//! - Build with `--features alsa`; without it only `--simulate` playback is available
//!
//! ## Usage
//! ```ignore
//! use pcm_playback_alsa::AlsaBackend;
//! use pcm_playback_core::{PlaybackConfiguration, PlaybackController};
//!
//! let file = std::fs::File::open("song.wav")?;
//! let mut controller = PlaybackController::new(AlsaBackend, PlaybackConfiguration::default(), file, "song.wav");
//! let report = controller.play()?;
//! ```

pub mod cli;

#[cfg(all(target_os = "linux", feature = "alsa"))]
pub mod alsa_device;
#[cfg(all(target_os = "linux", feature = "alsa"))]
pub mod device_enumerator;

#[cfg(all(target_os = "linux", feature = "alsa"))]
pub use alsa_device::{AlsaBackend, AlsaDevice};
#[cfg(all(target_os = "linux", feature = "alsa"))]
pub use device_enumerator::{DeviceEnumerator, PlaybackDeviceInfo};
