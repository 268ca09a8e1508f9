use crate::models::audio_models::{AccessMode, SampleFormat};
use crate::models::error::{DeviceError, WriteFault};

/// Entry point into a platform audio subsystem.
///
/// Implemented by:
/// - `SimulatedBackend` (in-process, for tests and dry runs)
/// - `AlsaBackend` (Linux, `pcm-playback-alsa`)
pub trait AudioBackend {
    type Device: PlaybackDevice;

    /// Open `device_id` for playback.
    fn open(&self, device_id: &str) -> Result<Self::Device, DeviceError>;
}

/// An open playback device.
///
/// The hardware-parameter methods stage one setting at a time so that a
/// failure can be attributed to a single negotiation stage. The `*_near`
/// setters return the value the driver actually accepted, which may differ
/// from the request. Read-back methods are only meaningful after `commit`.
///
/// Errors from configuration calls are plain strings, wrapped into
/// `DeviceError::NegotiationFailed` by the negotiator.
pub trait PlaybackDevice {
    fn set_access(&mut self, access: AccessMode) -> Result<(), String>;

    fn set_format(&mut self, format: SampleFormat) -> Result<(), String>;

    fn set_channels_near(&mut self, channels: u32) -> Result<u32, String>;

    fn set_rate_near(&mut self, rate: u32) -> Result<u32, String>;

    /// Install the staged parameter set on the device.
    fn commit(&mut self) -> Result<(), String>;

    /// Committed period size in frames.
    fn period_size(&self) -> Result<usize, String>;

    /// Committed channel count.
    fn channels(&self) -> Result<u32, String>;

    /// Committed sample rate in Hz.
    fn rate(&self) -> Result<u32, String>;

    /// Write `frames` interleaved frames taken from `data`.
    ///
    /// Blocks while the device ring buffer is full. Returns frames written.
    fn write_interleaved(&mut self, data: &[u8], frames: usize) -> Result<usize, WriteFault>;

    /// Clear an underrun without closing the handle.
    fn recover_underrun(&mut self) -> Result<(), String>;

    /// Block until every queued frame has been played.
    fn drain(&mut self) -> Result<(), String>;

    /// Release the device. Called exactly once by the owner.
    fn close(&mut self);
}
