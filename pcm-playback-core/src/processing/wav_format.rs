//! WAV file format utilities.
//!
//! Decodes and generates the canonical 44-byte RIFF WAV header that
//! immediately precedes interleaved PCM sample data.

use crate::models::audio_models::AudioHeader;
use crate::models::error::HeaderError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// PCM format code in the `fmt ` chunk.
pub const PCM_FORMAT_CODE: u16 = 1;

const RIFF_MARKER: &[u8; 4] = b"RIFF";
const WAVE_MARKER: &[u8; 4] = b"WAVE";
const FMT_MARKER: &[u8; 4] = b"fmt ";
const DATA_MARKER: &[u8; 4] = b"data";

/// Parse and validate a 44-byte WAV header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  fmt chunk length (16 for PCM)
/// [20-21]  format code (1 = PCM)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate
/// [32-33]  block_align
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Only the first `WAV_HEADER_SIZE` bytes are examined; anything after is
/// sample data. Returns a typed error rather than a partially filled header.
pub fn parse_header(bytes: &[u8]) -> Result<AudioHeader, HeaderError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(HeaderError::Truncated {
            expected: WAV_HEADER_SIZE,
            actual: bytes.len(),
        });
    }

    let riff_marker = marker(bytes, 0);
    let wave_marker = marker(bytes, 8);
    let fmt_marker = marker(bytes, 12);
    let data_marker = marker(bytes, 36);

    expect_marker("RIFF", &riff_marker, RIFF_MARKER)?;
    expect_marker("WAVE", &wave_marker, WAVE_MARKER)?;
    expect_marker("fmt", &fmt_marker, FMT_MARKER)?;
    expect_marker("data", &data_marker, DATA_MARKER)?;

    let format_type = read_u16(bytes, 20);
    if format_type != PCM_FORMAT_CODE {
        return Err(HeaderError::UnsupportedEncoding { format_type });
    }

    let channels = read_u16(bytes, 22);
    if channels == 0 {
        return Err(HeaderError::InvalidField {
            field: "channels",
            value: 0,
        });
    }

    let bits_per_sample = read_u16(bytes, 34);
    if bits_per_sample == 0 {
        return Err(HeaderError::InvalidField {
            field: "bits_per_sample",
            value: 0,
        });
    }

    Ok(AudioHeader {
        riff_marker,
        file_size: read_u32(bytes, 4),
        wave_marker,
        fmt_marker,
        fmt_chunk_len: read_u32(bytes, 16),
        format_type,
        channels,
        sample_rate: read_u32(bytes, 24),
        byte_rate: read_u32(bytes, 28),
        block_align: read_u16(bytes, 32),
        bits_per_sample,
        data_marker,
        data_len: read_u32(bytes, 40),
    })
}

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian. Same layout as `parse_header`.
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * channels as u32 * bit_depth as u32 / 8;
    let block_align = (channels as u32 * bit_depth as u32 / 8) as u16;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(RIFF_MARKER);
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(WAVE_MARKER);

    // fmt sub-chunk
    header[12..16].copy_from_slice(FMT_MARKER);
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(DATA_MARKER);
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

fn marker(bytes: &[u8], offset: usize) -> [u8; 4] {
    [bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]]
}

fn expect_marker(field: &'static str, found: &[u8; 4], expected: &[u8; 4]) -> Result<(), HeaderError> {
    if found == expected {
        return Ok(());
    }
    Err(HeaderError::MalformedContainer {
        field,
        expected: String::from_utf8_lossy(expected).into_owned(),
        found: String::from_utf8_lossy(found).into_owned(),
    })
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}
