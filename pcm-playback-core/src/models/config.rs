use std::path::PathBuf;

/// Largest periods-per-buffer value accepted by `validate`.
pub const MAX_PERIODS_PER_BUFFER: u32 = 64;

/// Configuration for a playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackConfiguration {
    /// Playback device identifier (default: `"default"`).
    pub device_id: String,

    /// Periods written per transfer chunk (default: 2).
    ///
    /// Policy constant, not read from hardware. Pick it according to the
    /// size of the device's internal ring buffer.
    pub periods_per_buffer: u32,

    /// Where to write the JSON playback report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl PlaybackConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.device_id.trim().is_empty() {
            return Err("device id must not be empty".into());
        }
        if !(1..=MAX_PERIODS_PER_BUFFER).contains(&self.periods_per_buffer) {
            return Err(format!(
                "periods per buffer must be between 1 and {}, got {}",
                MAX_PERIODS_PER_BUFFER, self.periods_per_buffer
            ));
        }
        Ok(())
    }
}

impl Default for PlaybackConfiguration {
    fn default() -> Self {
        Self {
            device_id: "default".into(),
            periods_per_buffer: 2,
            report_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = PlaybackConfiguration::default();
        assert_eq!(config.device_id, "default");
        assert_eq!(config.periods_per_buffer, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_periods() {
        let config = PlaybackConfiguration {
            periods_per_buffer: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_blank_device() {
        let config = PlaybackConfiguration {
            device_id: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
