//! ALSA playback device enumeration via PCM name hints.

use alsa::device_name::HintIter;
use alsa::Direction;

use pcm_playback_core::models::error::DeviceError;

/// A playback-capable PCM as advertised by ALSA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackDeviceInfo {
    /// Name to pass to `--device` (e.g. `default`, `hw:CARD=PCH,DEV=0`).
    pub name: String,
    /// Human description; ALSA splits it over several lines.
    pub description: Option<String>,
}

/// Lists PCM devices from the ALSA configuration and sound cards.
pub struct DeviceEnumerator;

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self
    }

    /// List PCMs usable for playback.
    ///
    /// Hints without a direction support both playback and capture.
    pub fn list_playback_devices(&self) -> Result<Vec<PlaybackDeviceInfo>, DeviceError> {
        let hints = HintIter::new_str(None, "pcm").map_err(|e| DeviceError::Unavailable {
            device: "pcm".into(),
            reason: format!("failed to enumerate devices: {}", e),
        })?;

        let devices = hints
            .filter(|hint| !matches!(hint.direction, Some(Direction::Capture)))
            .filter_map(|hint| {
                let name = hint.name?;
                Some(PlaybackDeviceInfo {
                    name,
                    description: hint.desc.map(|d| d.replace('\n', " ")),
                })
            })
            .collect();
        Ok(devices)
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
