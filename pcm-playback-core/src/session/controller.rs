use std::io::{self, Read};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::models::audio_models::AudioHeader;
use crate::models::config::PlaybackConfiguration;
use crate::models::error::PlaybackError;
use crate::models::playback_result::PlaybackReport;
use crate::models::state::PlaybackState;
use crate::processing::wav_format::{self, WAV_HEADER_SIZE};
use crate::session::negotiator::DeviceNegotiator;
use crate::session::streaming::{StreamEnd, StreamingWriter};
use crate::storage::report;
use crate::traits::playback_delegate::PlaybackDelegate;
use crate::traits::playback_device::{AudioBackend, PlaybackDevice};

/// Owns one playback run from header parse to device close.
///
/// ```text
/// [source] → parse header → open device → negotiate → StreamingWriter → drain → close
/// ```
///
/// The controller holds the source, device handle, parsed header, and
/// streaming writer. `play` releases all of them before returning, on
/// success and on every failure path; `Drop` does the same if `play` was
/// never called. The device is closed exactly once.
pub struct PlaybackController<B: AudioBackend, R: Read> {
    backend: B,
    config: PlaybackConfiguration,
    source_label: String,
    source: Option<R>,
    device: Option<B::Device>,
    header: Option<AudioHeader>,
    writer: Option<StreamingWriter>,
    state: Option<PlaybackState>,
    interrupt: Arc<AtomicBool>,
    delegate: Option<Arc<dyn PlaybackDelegate>>,
}

impl<B: AudioBackend, R: Read> PlaybackController<B, R> {
    /// `source_label` names the source in logs and reports (usually the path).
    pub fn new(backend: B, config: PlaybackConfiguration, source: R, source_label: impl Into<String>) -> Self {
        Self {
            backend,
            config,
            source_label: source_label.into(),
            source: Some(source),
            device: None,
            header: None,
            writer: None,
            state: None,
            interrupt: Arc::new(AtomicBool::new(false)),
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn PlaybackDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Use `flag` as the interrupt request. Raising it while streaming
    /// drains and closes the device instead of reading further.
    pub fn set_interrupt_flag(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = flag;
    }

    /// Current lifecycle state; `None` before the device is opened.
    pub fn state(&self) -> Option<PlaybackState> {
        self.state
    }

    /// Run the whole playback sequence. May be called once.
    pub fn play(&mut self) -> Result<PlaybackReport, PlaybackError> {
        if self.state.is_some() || self.source.is_none() {
            return Err(PlaybackError::InvalidState("playback already ran".into()));
        }

        let started_at = chrono::Utc::now();
        let result = self.run(started_at);

        if let Err(ref e) = result {
            log::error!("Playback failed during {}: {}", e.stage_name(), e);
            if let Some(ref delegate) = self.delegate {
                delegate.on_error(e);
            }
        }

        self.release();

        let report = result?;
        if let Some(ref path) = self.config.report_path {
            match report::write_report(&report, path) {
                Ok(()) => log::info!("Wrote playback report to {}", path.display()),
                Err(e) => log::warn!("Could not write playback report: {}", e),
            }
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_playback_finished(&report);
        }
        Ok(report)
    }

    fn run(&mut self, started_at: chrono::DateTime<chrono::Utc>) -> Result<PlaybackReport, PlaybackError> {
        self.config.validate().map_err(PlaybackError::Configuration)?;

        let source = self
            .source
            .as_mut()
            .ok_or_else(|| PlaybackError::InvalidState("source already released".into()))?;
        let header = read_header(source)?;
        log::debug!("{}", header);
        log::debug!(
            "Nominal duration {:.2}s at {} bytes per sample",
            header.duration_secs(),
            header.bytes_per_sample()
        );
        if header.bits_per_sample != 16 {
            log::warn!(
                "File declares {} bits per sample; the device is negotiated as 16-bit",
                header.bits_per_sample
            );
        }
        self.header = Some(header.clone());

        let negotiator = DeviceNegotiator::new(self.config.periods_per_buffer);
        let device = negotiator.open(&self.backend, &self.config.device_id)?;
        self.device = Some(device);
        self.set_state(PlaybackState::Opened);

        let device = self.device_mut()?;
        let negotiated = negotiator.negotiate(device, header.channels as u32, header.sample_rate)?;

        let writer = StreamingWriter::new(&negotiated);
        log::info!(
            "Transfer buffer: {} bytes ({} frames per write)",
            writer.buffer_size(),
            writer.frames_per_chunk()
        );
        self.writer = Some(writer);
        self.set_state(PlaybackState::Negotiated);

        self.set_state(PlaybackState::Streaming);
        let (Some(device), Some(source), Some(writer)) =
            (self.device.as_mut(), self.source.as_mut(), self.writer.as_mut())
        else {
            return Err(PlaybackError::InvalidState("resources released while streaming".into()));
        };
        let end = writer.run(device, source, &self.interrupt, self.delegate.as_deref())?;

        self.set_state(PlaybackState::Draining);
        log::info!("Device is now draining...");
        self.device_mut()?
            .drain()
            .map_err(|e| PlaybackError::Write(format!("drain failed: {}", e)))?;

        let stats = self
            .writer
            .as_ref()
            .map(StreamingWriter::stats)
            .unwrap_or_default();
        if stats.underruns > 0 {
            log::warn!("Playback finished with {} underruns", stats.underruns);
        }

        Ok(PlaybackReport::new(
            &self.config.device_id,
            &self.source_label,
            header,
            negotiated,
            stats,
            end == StreamEnd::Interrupted,
            started_at,
        ))
    }

    fn device_mut(&mut self) -> Result<&mut B::Device, PlaybackError> {
        self.device
            .as_mut()
            .ok_or_else(|| PlaybackError::InvalidState("device not open".into()))
    }

    fn set_state(&mut self, next: PlaybackState) {
        if let Some(current) = self.state {
            if !current.can_transition_to(next) {
                log::warn!("Unexpected state transition {:?} -> {:?}", current, next);
            }
        }
        log::debug!("Playback state: {:?}", next);
        self.state = Some(next);
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(next);
        }
    }

    /// Close the device, then drop the writer, header, and source.
    fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.close();
            log::info!("Done playing, closed device {:?}", self.config.device_id);
        }
        self.writer = None;
        self.header = None;
        self.source = None;

        if self.state.is_some_and(|state| !state.is_terminal()) {
            self.set_state(PlaybackState::Closed);
        }
    }
}

impl<B: AudioBackend, R: Read> Drop for PlaybackController<B, R> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Read exactly the fixed header, stopping early only at end of stream.
fn read_header<R: Read + ?Sized>(source: &mut R) -> Result<AudioHeader, PlaybackError> {
    let mut bytes = [0u8; WAV_HEADER_SIZE];
    let mut filled = 0;
    while filled < WAV_HEADER_SIZE {
        match source.read(&mut bytes[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PlaybackError::Source(format!("failed to read header: {}", e))),
        }
    }
    Ok(wav_format::parse_header(&bytes[..filled])?)
}
