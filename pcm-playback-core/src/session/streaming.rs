use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};

use crate::models::audio_models::{NegotiatedConfig, PlaybackStats};
use crate::models::error::{PlaybackError, WriteFault};
use crate::processing::transfer_buffer::TransferBuffer;
use crate::traits::playback_delegate::PlaybackDelegate;
use crate::traits::playback_device::PlaybackDevice;

/// Why the streaming loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// A read returned zero bytes.
    Exhausted,
    /// The interrupt flag was raised between chunks.
    Interrupted,
}

/// Moves sample data from the source to the device one chunk at a time.
///
/// Data flow per iteration:
/// ```text
/// [source] → fill TransferBuffer (chunk_bytes) → write_interleaved(frames_per_chunk)
///                                                   ├ ok       → next chunk
///                                                   ├ underrun → prepare, next chunk
///                                                   └ fatal    → abort
/// ```
///
/// A chunk lost to an underrun is not rewritten; playback resumes with
/// the next chunk read, leaving an audible gap but keeping stream order.
pub struct StreamingWriter {
    buffer: TransferBuffer,
    frames_per_chunk: usize,
    stats: PlaybackStats,
    chunk_index: u64,
    hasher: Sha256,
}

impl StreamingWriter {
    pub fn new(config: &NegotiatedConfig) -> Self {
        Self {
            buffer: TransferBuffer::new(config),
            frames_per_chunk: config.frames_per_chunk(),
            stats: PlaybackStats::default(),
            chunk_index: 0,
            hasher: Sha256::new(),
        }
    }

    /// Transfer buffer size in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn frames_per_chunk(&self) -> usize {
        self.frames_per_chunk
    }

    /// Counters so far, with the checksum of everything read.
    pub fn stats(&self) -> PlaybackStats {
        let digest = self.hasher.clone().finalize();
        PlaybackStats {
            source_checksum: hex_encode(&digest),
            ..self.stats.clone()
        }
    }

    /// Stream `source` to `device` until the source is exhausted, the
    /// interrupt flag is raised, or a fatal write error occurs.
    pub fn run<D, R>(
        &mut self,
        device: &mut D,
        source: &mut R,
        interrupt: &AtomicBool,
        delegate: Option<&dyn PlaybackDelegate>,
    ) -> Result<StreamEnd, PlaybackError>
    where
        D: PlaybackDevice + ?Sized,
        R: Read + ?Sized,
    {
        loop {
            if interrupt.load(Ordering::SeqCst) {
                log::info!("Interrupt requested after {} chunks", self.chunk_index);
                return Ok(StreamEnd::Interrupted);
            }

            let read = self
                .buffer
                .fill_from(source)
                .map_err(|e| PlaybackError::Source(format!("read failed: {}", e)))?;
            if read == 0 {
                log::debug!("Source exhausted after {} chunks", self.chunk_index);
                return Ok(StreamEnd::Exhausted);
            }

            self.stats.bytes_read += read as u64;
            self.hasher.update(self.buffer.filled());

            let frames = self.buffer.frames();
            if self.buffer.partial_frame_bytes() > 0 {
                log::warn!(
                    "Dropping {} trailing bytes that do not form a whole frame",
                    self.buffer.partial_frame_bytes()
                );
            }
            if frames == 0 {
                continue;
            }
            if frames < self.frames_per_chunk {
                log::debug!("Final short chunk: {} of {} frames", frames, self.frames_per_chunk);
            }

            let index = self.chunk_index;
            self.chunk_index += 1;
            self.write_chunk(device, index, frames, delegate)?;
        }
    }

    fn write_chunk<D: PlaybackDevice + ?Sized>(
        &mut self,
        device: &mut D,
        index: u64,
        frames: usize,
        delegate: Option<&dyn PlaybackDelegate>,
    ) -> Result<(), PlaybackError> {
        let frame_bytes = self.buffer.frame_bytes();
        let data = self.buffer.frame_data();
        let mut offset = 0;

        // A short write leaves the rest of the chunk queued; finish it before reading on.
        while offset < frames {
            match device.write_interleaved(&data[offset * frame_bytes..], frames - offset) {
                Ok(0) => {
                    return Err(PlaybackError::Write(format!("device accepted no frames on chunk {}", index)));
                }
                Ok(written) => {
                    self.stats.frames_written += written as u64;
                    offset += written;
                }
                Err(WriteFault::Underrun) => {
                    log::warn!("Underrun occurred on chunk {}, preparing device", index);
                    self.stats.underruns += 1;
                    device
                        .recover_underrun()
                        .map_err(|e| PlaybackError::Write(format!("underrun recovery failed: {}", e)))?;
                    if let Some(d) = delegate {
                        d.on_underrun(index);
                    }
                    return Ok(());
                }
                Err(WriteFault::Fatal(reason)) => {
                    log::error!("Cannot write to playback device on chunk {}: {}", index, reason);
                    return Err(PlaybackError::Write(reason));
                }
            }
        }

        self.stats.chunks_written += 1;
        Ok(())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use std::io;

    use parking_lot::Mutex;

    use super::*;
    use crate::backends::simulated::{DeviceCall, FaultPlan, SimulatedBackend, SimulatedDevice, WriteOutcome};
    use crate::session::negotiator::DeviceNegotiator;
    use crate::traits::playback_device::AudioBackend;

    fn negotiated(backend: &SimulatedBackend) -> (SimulatedDevice, NegotiatedConfig) {
        let negotiator = DeviceNegotiator::new(2);
        let mut device = backend.open("sim").unwrap();
        let config = negotiator.negotiate(&mut device, 2, 44100).unwrap();
        (device, config)
    }

    /// Distinct, position-dependent bytes so ordering errors show up.
    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[derive(Default)]
    struct UnderrunLog(Mutex<Vec<u64>>);

    impl PlaybackDelegate for UnderrunLog {
        fn on_underrun(&self, chunk_index: u64) {
            self.0.lock().push(chunk_index);
        }
    }

    #[test]
    fn every_write_uses_chunk_size() {
        let backend = SimulatedBackend::new(FaultPlan {
            period_frames: 8,
            ..Default::default()
        });
        let (mut device, config) = negotiated(&backend);
        let mut writer = StreamingWriter::new(&config);
        assert_eq!(writer.buffer_size(), 8 * 2 * 2 * 2);

        let data = pattern(writer.buffer_size() * 3);
        let end = writer
            .run(&mut device, &mut data.as_slice(), &AtomicBool::new(false), None)
            .unwrap();

        assert_eq!(end, StreamEnd::Exhausted);
        let journal = backend.journal();
        let journal = journal.lock();
        assert_eq!(journal.write_calls(), 3);
        for call in &journal.calls {
            if let DeviceCall::Write { frames, .. } = call {
                assert_eq!(*frames, 16);
            }
        }
        assert_eq!(journal.played, data);
    }

    #[test]
    fn final_partial_chunk_writes_remaining_frames() {
        let backend = SimulatedBackend::new(FaultPlan {
            period_frames: 8,
            ..Default::default()
        });
        let (mut device, config) = negotiated(&backend);
        let mut writer = StreamingWriter::new(&config);

        // Two full chunks plus five frames.
        let data = pattern(writer.buffer_size() * 2 + 5 * 4);
        writer
            .run(&mut device, &mut data.as_slice(), &AtomicBool::new(false), None)
            .unwrap();

        let stats = writer.stats();
        assert_eq!(stats.frames_written, 16 + 16 + 5);
        assert_eq!(stats.chunks_written, 3);
        assert_eq!(stats.bytes_read, data.len() as u64);
        assert_eq!(backend.journal().lock().played, data);
    }

    #[test]
    fn underrun_resets_and_continues_with_next_chunk() {
        let backend = SimulatedBackend::new(FaultPlan {
            period_frames: 4,
            underrun_on_writes: vec![1],
            ..Default::default()
        });
        let (mut device, config) = negotiated(&backend);
        let mut writer = StreamingWriter::new(&config);
        let chunk = writer.buffer_size();
        let data = pattern(chunk * 4);
        let log = UnderrunLog::default();

        let end = writer
            .run(&mut device, &mut data.as_slice(), &AtomicBool::new(false), Some(&log as &dyn PlaybackDelegate))
            .unwrap();

        assert_eq!(end, StreamEnd::Exhausted);
        assert_eq!(*log.0.lock(), vec![1]);

        let stats = writer.stats();
        assert_eq!(stats.underruns, 1);
        assert_eq!(stats.chunks_written, 3);
        assert_eq!(stats.bytes_read, data.len() as u64);

        let journal = backend.journal();
        let journal = journal.lock();
        // Chunk 1 is dropped, not replayed; the rest stay in order.
        let mut expected = data[..chunk].to_vec();
        expected.extend_from_slice(&data[chunk * 2..]);
        assert_eq!(journal.played, expected);

        let underrun_at = journal
            .calls
            .iter()
            .position(|c| matches!(c, DeviceCall::Write { outcome: WriteOutcome::Underrun, .. }))
            .unwrap();
        assert_eq!(journal.calls[underrun_at + 1], DeviceCall::RecoverUnderrun);
        assert_eq!(journal.count(&DeviceCall::RecoverUnderrun), 1);
    }

    #[test]
    fn fatal_write_aborts_loop() {
        let backend = SimulatedBackend::new(FaultPlan {
            period_frames: 4,
            fatal_on_write: Some(2),
            ..Default::default()
        });
        let (mut device, config) = negotiated(&backend);
        let mut writer = StreamingWriter::new(&config);
        let data = pattern(writer.buffer_size() * 6);

        let err = writer
            .run(&mut device, &mut data.as_slice(), &AtomicBool::new(false), None)
            .unwrap_err();

        assert!(matches!(err, PlaybackError::Write(_)));
        assert_eq!(backend.journal().lock().write_calls(), 3);
        assert_eq!(writer.stats().chunks_written, 2);
    }

    #[test]
    fn interrupt_stops_before_next_read() {
        let backend = SimulatedBackend::default();
        let (mut device, config) = negotiated(&backend);
        let mut writer = StreamingWriter::new(&config);
        let data = pattern(writer.buffer_size() * 2);

        let end = writer
            .run(&mut device, &mut data.as_slice(), &AtomicBool::new(true), None)
            .unwrap();

        assert_eq!(end, StreamEnd::Interrupted);
        assert_eq!(writer.stats().bytes_read, 0);
        assert_eq!(backend.journal().lock().write_calls(), 0);
    }

    #[test]
    fn read_error_is_source_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }

        let backend = SimulatedBackend::default();
        let (mut device, config) = negotiated(&backend);
        let mut writer = StreamingWriter::new(&config);

        let err = writer
            .run(&mut device, &mut Broken, &AtomicBool::new(false), None)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Source(ref m) if m.contains("disk on fire")));
    }

    #[test]
    fn checksum_covers_all_bytes_read() {
        let backend = SimulatedBackend::default();
        let (mut device, config) = negotiated(&backend);
        let mut writer = StreamingWriter::new(&config);
        let data = pattern(10_000);

        writer
            .run(&mut device, &mut data.as_slice(), &AtomicBool::new(false), None)
            .unwrap();

        assert_eq!(writer.stats().source_checksum, hex_encode(&Sha256::digest(&data)));
    }
}
