//! ALSA playback device.
//!
//! Opens a PCM playback handle in blocking mode and exposes the staged
//! hardware-parameter negotiation required by `PlaybackDevice`.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};

use pcm_playback_core::models::audio_models::{AccessMode, SampleFormat};
use pcm_playback_core::models::error::{DeviceError, WriteFault};
use pcm_playback_core::traits::playback_device::{AudioBackend, PlaybackDevice};

/// Backend opening ALSA PCM devices by name (`default`, `hw:0,0`, `plughw:1`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaBackend;

impl AudioBackend for AlsaBackend {
    type Device = AlsaDevice;

    fn open(&self, device_id: &str) -> Result<AlsaDevice, DeviceError> {
        let pcm = PCM::new(device_id, Direction::Playback, false).map_err(|e| DeviceError::Unavailable {
            device: device_id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(AlsaDevice {
            device_id: device_id.to_string(),
            pcm: Some(pcm),
            staged: Staged::default(),
        })
    }
}

/// Settings accepted so far, re-applied on every stage.
#[derive(Debug, Clone, Copy, Default)]
struct Staged {
    access: Option<Access>,
    format: Option<Format>,
    channels: Option<u32>,
    rate: Option<u32>,
}

/// An open ALSA playback handle.
///
/// `HwParams` borrows the PCM, so rather than holding one across calls each
/// stage starts from a fresh `HwParams::any` configuration space, re-applies
/// the settings accepted so far, and then applies its own. `commit`
/// installs the full set.
pub struct AlsaDevice {
    device_id: String,
    pcm: Option<PCM>,
    staged: Staged,
}

impl AlsaDevice {
    fn pcm(&self) -> Result<&PCM, String> {
        self.pcm.as_ref().ok_or_else(|| "device is closed".to_string())
    }

    fn staged_params(&self) -> Result<HwParams<'_>, String> {
        let hwp = HwParams::any(self.pcm()?).map_err(|e| format!("cannot initialize hardware parameters: {}", e))?;
        if let Some(access) = self.staged.access {
            hwp.set_access(access).map_err(|e| e.to_string())?;
        }
        if let Some(format) = self.staged.format {
            hwp.set_format(format).map_err(|e| e.to_string())?;
        }
        if let Some(channels) = self.staged.channels {
            hwp.set_channels(channels).map_err(|e| e.to_string())?;
        }
        if let Some(rate) = self.staged.rate {
            hwp.set_rate(rate, ValueOr::Nearest).map_err(|e| e.to_string())?;
        }
        Ok(hwp)
    }

    fn current_params(&self) -> Result<HwParams<'_>, String> {
        self.pcm()?
            .hw_params_current()
            .map_err(|e| format!("cannot read committed parameters: {}", e))
    }
}

impl PlaybackDevice for AlsaDevice {
    fn set_access(&mut self, access: AccessMode) -> Result<(), String> {
        let access = match access {
            AccessMode::RwInterleaved => Access::RWInterleaved,
        };
        self.staged_params()?
            .set_access(access)
            .map_err(|e| format!("cannot set interleaved mode: {}", e))?;
        self.staged.access = Some(access);
        Ok(())
    }

    fn set_format(&mut self, format: SampleFormat) -> Result<(), String> {
        let format = match format {
            SampleFormat::S16Le => Format::S16LE,
        };
        self.staged_params()?
            .set_format(format)
            .map_err(|e| format!("cannot set PCM format: {}", e))?;
        self.staged.format = Some(format);
        Ok(())
    }

    fn set_channels_near(&mut self, channels: u32) -> Result<u32, String> {
        let chosen = {
            let hwp = self.staged_params()?;
            hwp.set_channels_near(channels)
                .map_err(|e| format!("cannot set number of channels: {}", e))?
        };
        self.staged.channels = Some(chosen);
        Ok(chosen)
    }

    fn set_rate_near(&mut self, rate: u32) -> Result<u32, String> {
        let chosen = {
            let hwp = self.staged_params()?;
            hwp.set_rate_near(rate, ValueOr::Nearest)
                .map_err(|e| format!("cannot set playback rate: {}", e))?
        };
        self.staged.rate = Some(chosen);
        Ok(chosen)
    }

    fn commit(&mut self) -> Result<(), String> {
        let hwp = self.staged_params()?;
        self.pcm()?
            .hw_params(&hwp)
            .map_err(|e| format!("cannot set hardware parameters: {}", e))
    }

    fn period_size(&self) -> Result<usize, String> {
        let frames = self
            .current_params()?
            .get_period_size()
            .map_err(|e| format!("can't get period size: {}", e))?;
        usize::try_from(frames).map_err(|_| format!("invalid period size {}", frames))
    }

    fn channels(&self) -> Result<u32, String> {
        self.current_params()?
            .get_channels()
            .map_err(|e| format!("can't get channel number: {}", e))
    }

    fn rate(&self) -> Result<u32, String> {
        self.current_params()?
            .get_rate()
            .map_err(|e| format!("cannot get rate: {}", e))
    }

    fn write_interleaved(&mut self, data: &[u8], frames: usize) -> Result<usize, WriteFault> {
        let pcm = self.pcm().map_err(WriteFault::Fatal)?;
        let expected = pcm.frames_to_bytes(frames as alsa::pcm::Frames);
        if expected < 0 || data.len() < expected as usize {
            return Err(WriteFault::Fatal(format!(
                "buffer holds {} bytes, {} frames need {}",
                data.len(),
                frames,
                expected
            )));
        }
        let io = pcm.io_bytes();
        match io.writei(&data[..expected as usize]) {
            Ok(written) => Ok(written),
            Err(e) => Err(WriteFault::from_errno(e.errno(), e.to_string())),
        }
    }

    fn recover_underrun(&mut self) -> Result<(), String> {
        self.pcm()?.prepare().map_err(|e| format!("prepare failed: {}", e))
    }

    fn drain(&mut self) -> Result<(), String> {
        self.pcm()?
            .drain()
            .map_err(|e| format!("drain of {} failed: {}", self.device_id, e))
    }

    fn close(&mut self) {
        // Dropping the PCM closes the handle.
        if self.pcm.take().is_some() {
            log::debug!("Closed ALSA PCM {:?}", self.device_id);
        }
    }
}
