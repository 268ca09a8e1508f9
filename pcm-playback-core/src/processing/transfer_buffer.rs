use std::io::{self, Read};

use crate::models::audio_models::NegotiatedConfig;

/// Fixed-size byte region moved from the source to the device each cycle.
///
/// Sized once from the read-back `NegotiatedConfig` and overwritten in
/// place on every fill. Never resized.
#[derive(Debug)]
pub struct TransferBuffer {
    data: Vec<u8>,
    frame_bytes: usize,
    filled: usize,
}

impl TransferBuffer {
    pub fn new(config: &NegotiatedConfig) -> Self {
        Self {
            data: vec![0; config.chunk_bytes()],
            frame_bytes: config.bytes_per_frame(),
            filled: 0,
        }
    }

    /// Total size in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    /// Read the next chunk from `source`.
    ///
    /// Keeps reading until the buffer is full or the source reports end of
    /// stream, so only the final chunk of a stream can come back short.
    /// Returns the number of bytes now held; zero means the source is
    /// exhausted.
    pub fn fill_from<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.data.len() {
            match source.read(&mut self.data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.filled = filled;
                    return Err(e);
                }
            }
        }
        self.filled = filled;
        Ok(filled)
    }

    /// Whole frames held after the last fill.
    pub fn frames(&self) -> usize {
        if self.frame_bytes == 0 {
            return 0;
        }
        self.filled / self.frame_bytes
    }

    /// Bytes of the last fill that don't form a whole frame.
    pub fn partial_frame_bytes(&self) -> usize {
        if self.frame_bytes == 0 {
            return self.filled;
        }
        self.filled % self.frame_bytes
    }

    /// Bytes of the last fill, including any trailing partial frame.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.filled]
    }

    /// The whole-frame prefix of the last fill, ready for an interleaved write.
    pub fn frame_data(&self) -> &[u8] {
        &self.data[..self.frames() * self.frame_bytes]
    }
}
