use crate::models::audio_models::{AccessMode, NegotiatedConfig, SampleFormat};
use crate::models::error::{DeviceError, NegotiationStage};
use crate::traits::playback_device::{AudioBackend, PlaybackDevice};

/// Opens playback devices and negotiates their hardware parameters.
///
/// Negotiation is fail-fast: the first stage that errors aborts the whole
/// sequence with `DeviceError::NegotiationFailed(stage)`. The returned
/// config carries the values read back after commit, never the hints.
#[derive(Debug, Clone, Copy)]
pub struct DeviceNegotiator {
    periods_per_buffer: u32,
}

impl DeviceNegotiator {
    pub fn new(periods_per_buffer: u32) -> Self {
        Self { periods_per_buffer }
    }

    pub fn open<B: AudioBackend>(&self, backend: &B, device_id: &str) -> Result<B::Device, DeviceError> {
        let device = backend.open(device_id)?;
        log::info!("Opened playback device {:?}", device_id);
        Ok(device)
    }

    /// Run the negotiation sequence against an open device.
    ///
    /// Sequence:
    /// 1. Interleaved read/write access
    /// 2. Signed 16-bit little-endian samples
    /// 3. Channel count nearest `requested_channels`
    /// 4. Sample rate nearest `requested_rate`
    /// 5. Commit
    ///
    /// then read back period size, channels, and rate.
    pub fn negotiate<D: PlaybackDevice + ?Sized>(
        &self,
        device: &mut D,
        requested_channels: u32,
        requested_rate: u32,
    ) -> Result<NegotiatedConfig, DeviceError> {
        let access = AccessMode::RwInterleaved;
        let format = SampleFormat::S16Le;

        run_stage(NegotiationStage::Access, device.set_access(access))?;
        run_stage(NegotiationStage::Format, device.set_format(format))?;

        let approx_channels = run_stage(NegotiationStage::Channels, device.set_channels_near(requested_channels))?;
        if approx_channels != requested_channels {
            log::debug!(
                "Driver approximated channels: requested {}, offered {}",
                requested_channels,
                approx_channels
            );
        }

        let approx_rate = run_stage(NegotiationStage::Rate, device.set_rate_near(requested_rate))?;
        if approx_rate != requested_rate {
            log::debug!(
                "Driver approximated rate: requested {} Hz, offered {} Hz",
                requested_rate,
                approx_rate
            );
        }

        run_stage(NegotiationStage::Commit, device.commit())?;

        let frames_per_period = run_stage(NegotiationStage::PeriodSize, device.period_size())?;
        let channels = run_stage(NegotiationStage::ReadChannels, device.channels())?;
        let sample_rate = run_stage(NegotiationStage::ReadRate, device.rate())?;

        if frames_per_period == 0 {
            return Err(DeviceError::NegotiationFailed {
                stage: NegotiationStage::PeriodSize,
                reason: "device reported a zero period size".into(),
            });
        }
        if channels == 0 {
            return Err(DeviceError::NegotiationFailed {
                stage: NegotiationStage::ReadChannels,
                reason: "device reported zero channels".into(),
            });
        }
        if sample_rate == 0 {
            return Err(DeviceError::NegotiationFailed {
                stage: NegotiationStage::ReadRate,
                reason: "device reported a zero sample rate".into(),
            });
        }

        if channels != requested_channels {
            log::warn!(
                "Device plays {} channels, file has {}; output will be misaligned",
                channels,
                requested_channels
            );
        }
        if sample_rate != requested_rate {
            log::warn!(
                "Device runs at {} Hz, file is {} Hz; playback speed will differ",
                sample_rate,
                requested_rate
            );
        }

        let config = NegotiatedConfig {
            access,
            sample_format: format,
            channels,
            sample_rate,
            frames_per_period,
            periods_per_buffer: self.periods_per_buffer,
        };
        log::info!(
            "Negotiated {} ch @ {} Hz {}, {} frames/period x {} periods",
            config.channels,
            config.sample_rate,
            config.sample_format,
            config.frames_per_period,
            config.periods_per_buffer
        );
        Ok(config)
    }
}

fn run_stage<T>(stage: NegotiationStage, result: Result<T, String>) -> Result<T, DeviceError> {
    match result {
        Ok(value) => {
            log::debug!("Negotiation {} ok", stage);
            Ok(value)
        }
        Err(reason) => {
            log::error!("Negotiation {} failed: {}", stage, reason);
            Err(DeviceError::NegotiationFailed { stage, reason })
        }
    }
}
