use std::fmt;

use serde::{Deserialize, Serialize};

/// Device access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Read/write transfers with channels interleaved per frame.
    RwInterleaved,
}

/// Device sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    #[serde(rename = "S16_LE")]
    S16Le,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16Le => 2,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S16Le => f.write_str("S16_LE"),
        }
    }
}

/// Decoded 44-byte WAV header.
///
/// Immutable once parsed. Multi-byte fields are little-endian on disk and
/// stored here as native integers; markers are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioHeader {
    pub riff_marker: [u8; 4],
    /// RIFF chunk size (file size - 8).
    pub file_size: u32,
    pub wave_marker: [u8; 4],
    pub fmt_marker: [u8; 4],
    pub fmt_chunk_len: u32,
    pub format_type: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    /// Bytes per frame (block align).
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_marker: [u8; 4],
    pub data_len: u32,
}

impl AudioHeader {
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }

    /// Nominal duration of the sample data, from `data_len / byte_rate`.
    pub fn duration_secs(&self) -> f64 {
        if self.byte_rate == 0 {
            return 0.0;
        }
        self.data_len as f64 / self.byte_rate as f64
    }
}

impl fmt::Display for AudioHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- WAV HEADER ---")?;
        writeln!(f, "RIFF marker  : {}", String::from_utf8_lossy(&self.riff_marker))?;
        writeln!(f, "File size    : {}", self.file_size)?;
        writeln!(f, "File type    : {}", String::from_utf8_lossy(&self.wave_marker))?;
        writeln!(f, "Format marker: {}", String::from_utf8_lossy(&self.fmt_marker))?;
        writeln!(f, "Format length: {}", self.fmt_chunk_len)?;
        writeln!(f, "Format type  : {}", self.format_type)?;
        writeln!(f, "Channels     : {}", self.channels)?;
        writeln!(f, "Sample rate  : {}", self.sample_rate)?;
        writeln!(f, "Bytes / sec  : {}", self.byte_rate)?;
        writeln!(f, "Bytes / frame: {}", self.block_align)?;
        writeln!(f, "Bits / sample: {}", self.bits_per_sample)?;
        write!(f, "Data length  : {}", self.data_len)
    }
}

/// Hardware parameters read back from the device after commit.
///
/// These are the values the driver actually chose, which may differ from
/// the header hints. All buffer sizing derives from this struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedConfig {
    pub access: AccessMode,
    pub sample_format: SampleFormat,
    pub channels: u32,
    pub sample_rate: u32,
    pub frames_per_period: usize,
    pub periods_per_buffer: u32,
}

impl NegotiatedConfig {
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.sample_format.bytes_per_sample()
    }

    /// Frames written to the device per transfer chunk.
    pub fn frames_per_chunk(&self) -> usize {
        self.frames_per_period * self.periods_per_buffer as usize
    }

    /// `frames_per_period × periods_per_buffer × channels × bytes_per_sample`.
    pub fn chunk_bytes(&self) -> usize {
        self.frames_per_chunk() * self.bytes_per_frame()
    }
}

/// Counters collected by the streaming writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStats {
    pub chunks_written: u64,
    pub frames_written: u64,
    pub underruns: u64,
    pub bytes_read: u64,
    /// Hex SHA-256 of every byte read from the source.
    pub source_checksum: String,
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn stereo_config() -> NegotiatedConfig {
        NegotiatedConfig {
            access: AccessMode::RwInterleaved,
            sample_format: SampleFormat::S16Le,
            channels: 2,
            sample_rate: 44100,
            frames_per_period: 940,
            periods_per_buffer: 2,
        }
    }

    #[test]
    fn chunk_bytes_formula() {
        let config = stereo_config();
        assert_eq!(config.bytes_per_frame(), 4);
        assert_eq!(config.frames_per_chunk(), 1880);
        assert_eq!(config.chunk_bytes(), 940 * 2 * 2 * 2);
    }

    fn header(bits_per_sample: u16, byte_rate: u32, data_len: u32) -> AudioHeader {
        AudioHeader {
            riff_marker: *b"RIFF",
            file_size: 36 + data_len,
            wave_marker: *b"WAVE",
            fmt_marker: *b"fmt ",
            fmt_chunk_len: 16,
            format_type: 1,
            channels: 2,
            sample_rate: 44100,
            byte_rate,
            block_align: 4,
            bits_per_sample,
            data_marker: *b"data",
            data_len,
        }
    }

    #[test]
    fn duration_from_data_len_and_byte_rate() {
        assert_relative_eq!(header(16, 176_400, 882_000).duration_secs(), 5.0);
        assert_relative_eq!(header(16, 176_400, 1_000).duration_secs(), 1_000.0 / 176_400.0);
    }

    #[test]
    fn zero_byte_rate_has_no_duration() {
        assert_eq!(header(16, 0, 882_000).duration_secs(), 0.0);
    }

    #[test]
    fn bytes_per_sample_rounds_up() {
        assert_eq!(header(8, 0, 0).bytes_per_sample(), 1);
        assert_eq!(header(12, 0, 0).bytes_per_sample(), 2);
        assert_eq!(header(16, 0, 0).bytes_per_sample(), 2);
        assert_eq!(header(24, 0, 0).bytes_per_sample(), 3);
    }

    #[test]
    fn sample_format_serializes_as_alsa_name() {
        let json = serde_json::to_string(&SampleFormat::S16Le).unwrap();
        assert_eq!(json, "\"S16_LE\"");
    }
}
