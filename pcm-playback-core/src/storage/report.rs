use std::fs;
use std::path::Path;

use crate::models::error::PlaybackError;
use crate::models::playback_result::PlaybackReport;

/// Write a playback report as pretty-printed JSON.
///
/// Creates the parent directory if it doesn't exist.
pub fn write_report(report: &PlaybackReport, path: &Path) -> Result<(), PlaybackError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| PlaybackError::Storage(format!("failed to create directory: {}", e)))?;
        }
    }
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| PlaybackError::Storage(format!("failed to serialize report: {}", e)))?;
    fs::write(path, json).map_err(|e| PlaybackError::Storage(format!("failed to write report: {}", e)))?;
    Ok(())
}

/// Read a playback report written by `write_report`.
pub fn read_report(path: &Path) -> Result<PlaybackReport, PlaybackError> {
    let json = fs::read_to_string(path)
        .map_err(|e| PlaybackError::Storage(format!("failed to read report: {}", e)))?;
    let report: PlaybackReport = serde_json::from_str(&json)
        .map_err(|e| PlaybackError::Storage(format!("failed to parse report: {}", e)))?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::{AccessMode, NegotiatedConfig, PlaybackStats, SampleFormat};
    use crate::processing::wav_format::{generate_wav_header, parse_header};

    fn sample_report() -> PlaybackReport {
        let header = parse_header(&generate_wav_header(44100, 16, 2, 1_764_000)).unwrap();
        let negotiated = NegotiatedConfig {
            access: AccessMode::RwInterleaved,
            sample_format: SampleFormat::S16Le,
            channels: 2,
            sample_rate: 44100,
            frames_per_period: 940,
            periods_per_buffer: 2,
        };
        let stats = PlaybackStats {
            chunks_written: 235,
            frames_written: 441_000,
            underruns: 1,
            bytes_read: 1_764_000,
            source_checksum: "ab".repeat(32),
        };
        PlaybackReport::new("default", "song.wav", header, negotiated, stats, false, chrono::Utc::now())
    }

    #[test]
    fn report_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.json");
        let report = sample_report();

        write_report(&report, &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["device_id"], "default");
        assert_eq!(value["negotiated"]["sample_format"], "S16_LE");
        assert_eq!(value["negotiated"]["access"], "rw_interleaved");
        assert_eq!(value["stats"]["underruns"], 1);
        assert_eq!(value["played_secs"], 10.0);

        let stored = read_report(&path).unwrap();
        assert_eq!(stored.header, report.header);
        assert_eq!(stored.started_at, report.started_at);
    }

    #[test]
    fn missing_report_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_report(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PlaybackError::Storage(_)));
    }
}
