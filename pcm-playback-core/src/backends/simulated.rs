//! In-process playback device.
//!
//! Accepts frames instantly, approximates hardware parameters the way a
//! driver would, and records every call in a shared [`DeviceJournal`] so
//! the caller can inspect what happened after the controller has consumed
//! and closed the device. Faults are scripted through a [`FaultPlan`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AccessMode, SampleFormat};
use crate::models::error::{DeviceError, NegotiationStage, WriteFault};
use crate::traits::playback_device::{AudioBackend, PlaybackDevice};

/// Period size used when the plan doesn't override it.
pub const DEFAULT_PERIOD_FRAMES: usize = 940;

/// Scripted device behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultPlan {
    /// Refuse to open the device.
    pub fail_open: bool,
    /// Fail this negotiation stage.
    pub fail_stage: Option<NegotiationStage>,
    /// Channel count the "driver" settles on instead of the request.
    pub channels_override: Option<u32>,
    /// Sample rate the "driver" settles on instead of the request.
    pub rate_override: Option<u32>,
    pub period_frames: usize,
    /// Zero-based write calls that report an underrun.
    pub underrun_on_writes: Vec<u64>,
    /// Zero-based write call that fails fatally.
    pub fatal_on_write: Option<u64>,
}

impl Default for FaultPlan {
    fn default() -> Self {
        Self {
            fail_open: false,
            fail_stage: None,
            channels_override: None,
            rate_override: None,
            period_frames: DEFAULT_PERIOD_FRAMES,
            underrun_on_writes: Vec::new(),
            fatal_on_write: None,
        }
    }
}

/// One recorded device call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Open(String),
    Stage(NegotiationStage),
    Write { frames: usize, outcome: WriteOutcome },
    RecoverUnderrun,
    Drain,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Accepted,
    Underrun,
    Fatal,
}

/// Everything the simulated device saw, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceJournal {
    pub calls: Vec<DeviceCall>,
    pub requested_channels: Option<u32>,
    pub requested_rate: Option<u32>,
    /// Bytes of every accepted write, concatenated.
    pub played: Vec<u8>,
}

impl DeviceJournal {
    pub fn write_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::Write { .. }))
            .count()
    }

    /// Frames the device accepted (underrun and fatal writes excluded).
    pub fn frames_accepted(&self) -> u64 {
        self.calls
            .iter()
            .map(|c| match c {
                DeviceCall::Write {
                    frames,
                    outcome: WriteOutcome::Accepted,
                } => *frames as u64,
                _ => 0,
            })
            .sum()
    }

    pub fn count(&self, call: &DeviceCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    /// Position of the first matching call.
    pub fn position(&self, call: &DeviceCall) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }

    /// Position of the last write call.
    pub fn last_write(&self) -> Option<usize> {
        self.calls
            .iter()
            .rposition(|c| matches!(c, DeviceCall::Write { .. }))
    }
}

/// Backend producing [`SimulatedDevice`]s that share one journal.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    plan: FaultPlan,
    journal: Arc<Mutex<DeviceJournal>>,
}

impl SimulatedBackend {
    pub fn new(plan: FaultPlan) -> Self {
        Self {
            plan,
            journal: Arc::new(Mutex::new(DeviceJournal::default())),
        }
    }

    /// Shared handle to the call journal.
    pub fn journal(&self) -> Arc<Mutex<DeviceJournal>> {
        Arc::clone(&self.journal)
    }
}

impl AudioBackend for SimulatedBackend {
    type Device = SimulatedDevice;

    fn open(&self, device_id: &str) -> Result<SimulatedDevice, DeviceError> {
        if self.plan.fail_open {
            return Err(DeviceError::Unavailable {
                device: device_id.to_string(),
                reason: "simulated open failure".into(),
            });
        }
        self.journal
            .lock()
            .calls
            .push(DeviceCall::Open(device_id.to_string()));
        Ok(SimulatedDevice {
            plan: self.plan.clone(),
            journal: Arc::clone(&self.journal),
            staged: StagedParams::default(),
            committed: None,
            write_index: 0,
            in_underrun: false,
            closed: false,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StagedParams {
    access: Option<AccessMode>,
    format: Option<SampleFormat>,
    channels: Option<u32>,
    rate: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct CommittedParams {
    format: SampleFormat,
    channels: u32,
    rate: u32,
    period_frames: usize,
}

/// A device handed out by [`SimulatedBackend`].
#[derive(Debug)]
pub struct SimulatedDevice {
    plan: FaultPlan,
    journal: Arc<Mutex<DeviceJournal>>,
    staged: StagedParams,
    committed: Option<CommittedParams>,
    write_index: u64,
    in_underrun: bool,
    closed: bool,
}

impl SimulatedDevice {
    fn enter_stage(&self, stage: NegotiationStage) -> Result<(), String> {
        self.journal.lock().calls.push(DeviceCall::Stage(stage));
        if self.plan.fail_stage == Some(stage) {
            return Err(format!("simulated failure at {}", stage));
        }
        Ok(())
    }

    fn committed(&self) -> Result<CommittedParams, String> {
        self.committed
            .ok_or_else(|| "hardware parameters not committed".to_string())
    }

    fn record_write(&self, frames: usize, outcome: WriteOutcome) {
        self.journal
            .lock()
            .calls
            .push(DeviceCall::Write { frames, outcome });
    }
}

impl PlaybackDevice for SimulatedDevice {
    fn set_access(&mut self, access: AccessMode) -> Result<(), String> {
        self.enter_stage(NegotiationStage::Access)?;
        self.staged.access = Some(access);
        Ok(())
    }

    fn set_format(&mut self, format: SampleFormat) -> Result<(), String> {
        self.enter_stage(NegotiationStage::Format)?;
        self.staged.format = Some(format);
        Ok(())
    }

    fn set_channels_near(&mut self, channels: u32) -> Result<u32, String> {
        self.journal.lock().requested_channels = Some(channels);
        self.enter_stage(NegotiationStage::Channels)?;
        let chosen = self.plan.channels_override.unwrap_or(channels);
        self.staged.channels = Some(chosen);
        Ok(chosen)
    }

    fn set_rate_near(&mut self, rate: u32) -> Result<u32, String> {
        self.journal.lock().requested_rate = Some(rate);
        self.enter_stage(NegotiationStage::Rate)?;
        let chosen = self.plan.rate_override.unwrap_or(rate);
        self.staged.rate = Some(chosen);
        Ok(chosen)
    }

    fn commit(&mut self) -> Result<(), String> {
        self.enter_stage(NegotiationStage::Commit)?;
        let staged = self.staged;
        if staged.access.is_none() {
            return Err("access mode not set".into());
        }
        let (Some(format), Some(channels), Some(rate)) = (staged.format, staged.channels, staged.rate) else {
            return Err("incomplete parameter set".into());
        };
        self.committed = Some(CommittedParams {
            format,
            channels,
            rate,
            period_frames: self.plan.period_frames,
        });
        Ok(())
    }

    fn period_size(&self) -> Result<usize, String> {
        self.enter_stage(NegotiationStage::PeriodSize)?;
        Ok(self.committed()?.period_frames)
    }

    fn channels(&self) -> Result<u32, String> {
        self.enter_stage(NegotiationStage::ReadChannels)?;
        Ok(self.committed()?.channels)
    }

    fn rate(&self) -> Result<u32, String> {
        self.enter_stage(NegotiationStage::ReadRate)?;
        Ok(self.committed()?.rate)
    }

    fn write_interleaved(&mut self, data: &[u8], frames: usize) -> Result<usize, WriteFault> {
        let index = self.write_index;
        self.write_index += 1;

        let params = match self.committed() {
            Ok(params) => params,
            Err(e) => {
                self.record_write(frames, WriteOutcome::Fatal);
                return Err(WriteFault::Fatal(e));
            }
        };
        let expected = frames * params.channels as usize * params.format.bytes_per_sample();
        if data.len() != expected {
            self.record_write(frames, WriteOutcome::Fatal);
            return Err(WriteFault::Fatal(format!(
                "buffer holds {} bytes, {} frames need {}",
                data.len(),
                frames,
                expected
            )));
        }
        if self.in_underrun || self.plan.fatal_on_write == Some(index) {
            self.record_write(frames, WriteOutcome::Fatal);
            return Err(WriteFault::Fatal("simulated device failure".into()));
        }
        if self.plan.underrun_on_writes.contains(&index) {
            self.in_underrun = true;
            self.record_write(frames, WriteOutcome::Underrun);
            return Err(WriteFault::Underrun);
        }

        self.record_write(frames, WriteOutcome::Accepted);
        self.journal.lock().played.extend_from_slice(data);
        Ok(frames)
    }

    fn recover_underrun(&mut self) -> Result<(), String> {
        self.journal.lock().calls.push(DeviceCall::RecoverUnderrun);
        self.in_underrun = false;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), String> {
        self.journal.lock().calls.push(DeviceCall::Drain);
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            log::warn!("simulated device closed twice");
        }
        self.closed = true;
        self.journal.lock().calls.push(DeviceCall::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed_device(plan: FaultPlan) -> (SimulatedDevice, Arc<Mutex<DeviceJournal>>) {
        let backend = SimulatedBackend::new(plan);
        let mut device = backend.open("sim").unwrap();
        device.set_access(AccessMode::RwInterleaved).unwrap();
        device.set_format(SampleFormat::S16Le).unwrap();
        device.set_channels_near(2).unwrap();
        device.set_rate_near(44100).unwrap();
        device.commit().unwrap();
        (device, backend.journal())
    }

    #[test]
    fn near_setters_report_driver_choice() {
        let backend = SimulatedBackend::new(FaultPlan {
            channels_override: Some(6),
            rate_override: Some(48000),
            ..Default::default()
        });
        let mut device = backend.open("sim").unwrap();
        assert_eq!(device.set_channels_near(2).unwrap(), 6);
        assert_eq!(device.set_rate_near(44100).unwrap(), 48000);

        let journal = backend.journal();
        assert_eq!(journal.lock().requested_channels, Some(2));
        assert_eq!(journal.lock().requested_rate, Some(44100));
    }

    #[test]
    fn read_back_requires_commit() {
        let backend = SimulatedBackend::default();
        let device = backend.open("sim").unwrap();
        assert!(device.period_size().is_err());
    }

    #[test]
    fn underrun_blocks_writes_until_recovered() {
        let (mut device, journal) = committed_device(FaultPlan {
            underrun_on_writes: vec![0],
            ..Default::default()
        });
        let chunk = vec![0u8; 16];

        assert_eq!(device.write_interleaved(&chunk, 4), Err(WriteFault::Underrun));
        assert!(matches!(device.write_interleaved(&chunk, 4), Err(WriteFault::Fatal(_))));
        device.recover_underrun().unwrap();
        assert_eq!(device.write_interleaved(&chunk, 4), Ok(4));

        assert_eq!(journal.lock().frames_accepted(), 4);
        assert_eq!(journal.lock().played.len(), 16);
    }

    #[test]
    fn mismatched_buffer_length_is_fatal() {
        let (mut device, _journal) = committed_device(FaultPlan::default());
        assert!(matches!(
            device.write_interleaved(&[0u8; 10], 4),
            Err(WriteFault::Fatal(_))
        ));
    }

    #[test]
    fn failing_stage_is_recorded() {
        let backend = SimulatedBackend::new(FaultPlan {
            fail_stage: Some(NegotiationStage::Format),
            ..Default::default()
        });
        let mut device = backend.open("sim").unwrap();
        device.set_access(AccessMode::RwInterleaved).unwrap();
        assert!(device.set_format(SampleFormat::S16Le).is_err());
        assert_eq!(
            backend.journal().lock().calls.last(),
            Some(&DeviceCall::Stage(NegotiationStage::Format))
        );
    }
}
