use serde::{Deserialize, Serialize};

use super::audio_models::{AudioHeader, NegotiatedConfig, PlaybackStats};

/// Summary of a completed playback run.
///
/// Serializable for JSON export via `storage::report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub id: String,
    pub device_id: String,
    pub source: String,
    pub header: AudioHeader,
    pub negotiated: NegotiatedConfig,
    pub stats: PlaybackStats,
    /// Set when an interrupt request cut the stream short.
    pub interrupted: bool,
    pub started_at: String,
    pub finished_at: String,
    /// Audio time delivered to the device, from frames written and the
    /// negotiated rate.
    pub played_secs: f64,
}

impl PlaybackReport {
    pub fn new(
        device_id: &str,
        source: &str,
        header: AudioHeader,
        negotiated: NegotiatedConfig,
        stats: PlaybackStats,
        interrupted: bool,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        let played_secs = if negotiated.sample_rate == 0 {
            0.0
        } else {
            stats.frames_written as f64 / negotiated.sample_rate as f64
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            source: source.to_string(),
            header,
            negotiated,
            stats,
            interrupted,
            started_at: started_at.to_rfc3339(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            played_secs,
        }
    }
}
