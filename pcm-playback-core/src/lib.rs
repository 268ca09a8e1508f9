//! # pcm-playback-core
//!
//! Platform-agnostic PCM playback core library.
//!
//! Parses the fixed 44-byte WAV header, negotiates hardware parameters with
//! a playback device, and streams interleaved sample data to it in
//! fixed-size chunks, recovering from buffer underruns. Platform backends
//! (ALSA on Linux) implement the `AudioBackend` / `PlaybackDevice` traits
//! and plug into the generic `PlaybackController`.
//!
//! ## Architecture
//!
//! ```text
//! pcm-playback-core (this crate)
//! ├── traits/       ← AudioBackend, PlaybackDevice, PlaybackDelegate
//! ├── models/       ← AudioHeader, NegotiatedConfig, PlaybackError, PlaybackState, etc.
//! ├── processing/   ← WAV header parsing, TransferBuffer
//! ├── session/      ← DeviceNegotiator, StreamingWriter, PlaybackController
//! ├── backends/     ← SimulatedBackend (in-process device with a call journal)
//! └── storage/      ← JSON playback reports
//! ```

pub mod backends;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use backends::simulated::{DeviceCall, DeviceJournal, FaultPlan, SimulatedBackend, SimulatedDevice};
pub use models::audio_models::{AccessMode, AudioHeader, NegotiatedConfig, PlaybackStats, SampleFormat};
pub use models::config::PlaybackConfiguration;
pub use models::error::{DeviceError, HeaderError, NegotiationStage, PlaybackError, WriteFault};
pub use models::playback_result::PlaybackReport;
pub use models::state::PlaybackState;
pub use processing::transfer_buffer::TransferBuffer;
pub use processing::wav_format::{generate_wav_header, parse_header, WAV_HEADER_SIZE};
pub use session::controller::PlaybackController;
pub use session::negotiator::DeviceNegotiator;
pub use session::streaming::{StreamEnd, StreamingWriter};
pub use traits::playback_delegate::PlaybackDelegate;
pub use traits::playback_device::{AudioBackend, PlaybackDevice};
