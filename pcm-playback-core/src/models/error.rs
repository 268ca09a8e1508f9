use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding the fixed-size WAV header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("malformed container: {field} marker is {found:?}, expected {expected:?}")]
    MalformedContainer {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("unsupported encoding: format code {format_type} is not PCM")]
    UnsupportedEncoding { format_type: u16 },

    #[error("invalid header field: {field} = {value}")]
    InvalidField { field: &'static str, value: u32 },
}

/// Ordered hardware negotiation stages.
///
/// Stages 1-5 configure and commit the parameter set; 6-8 read the
/// committed values back from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStage {
    Access,
    Format,
    Channels,
    Rate,
    Commit,
    PeriodSize,
    ReadChannels,
    ReadRate,
}

impl NegotiationStage {
    /// All stages in the order the negotiator runs them.
    pub const ALL: [NegotiationStage; 8] = [
        Self::Access,
        Self::Format,
        Self::Channels,
        Self::Rate,
        Self::Commit,
        Self::PeriodSize,
        Self::ReadChannels,
        Self::ReadRate,
    ];

    /// 1-based position in the negotiation sequence.
    pub fn number(self) -> u8 {
        match self {
            Self::Access => 1,
            Self::Format => 2,
            Self::Channels => 3,
            Self::Rate => 4,
            Self::Commit => 5,
            Self::PeriodSize => 6,
            Self::ReadChannels => 7,
            Self::ReadRate => 8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Access => "set interleaved access",
            Self::Format => "set sample format",
            Self::Channels => "set channel count",
            Self::Rate => "set sample rate",
            Self::Commit => "commit hardware parameters",
            Self::PeriodSize => "read period size",
            Self::ReadChannels => "read channel count",
            Self::ReadRate => "read sample rate",
        }
    }
}

impl fmt::Display for NegotiationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.number(), self.label())
    }
}

/// Errors raised while opening or negotiating the playback device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device {device:?} unavailable: {reason}")]
    Unavailable { device: String, reason: String },

    #[error("negotiation failed at {stage}: {reason}")]
    NegotiationFailed {
        stage: NegotiationStage,
        reason: String,
    },
}

impl DeviceError {
    /// The failing negotiation stage, if this is a negotiation failure.
    pub fn stage(&self) -> Option<NegotiationStage> {
        match self {
            Self::NegotiationFailed { stage, .. } => Some(*stage),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Outcome of a failed interleaved write, as reported by the device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteFault {
    /// The device ring buffer ran dry. Recoverable with a prepare.
    #[error("buffer underrun")]
    Underrun,

    #[error("write failed: {0}")]
    Fatal(String),
}

/// errno reported by a blocking PCM write when the device underran.
pub const EPIPE: i32 = 32;

impl WriteFault {
    /// Classify a failed write by its errno. Only `EPIPE` is recoverable.
    pub fn from_errno(errno: i32, message: impl Into<String>) -> Self {
        if errno == EPIPE {
            WriteFault::Underrun
        } else {
            WriteFault::Fatal(message.into())
        }
    }
}

/// Top-level playback error returned by the controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("source error: {0}")]
    Source(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("write error: {0}")]
    Write(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl PlaybackError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Source(_) | Self::Configuration(_) | Self::Storage(_) => 1,
            Self::Header(_) => 3,
            Self::Device(_) => 4,
            Self::Write(_) => 5,
            Self::InvalidState(_) => 70,
        }
    }

    /// Short name of the stage that failed, for diagnostics.
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::Source(_) => "source",
            Self::Configuration(_) => "configuration",
            Self::Header(_) => "header",
            Self::Device(DeviceError::Unavailable { .. }) => "device open",
            Self::Device(DeviceError::NegotiationFailed { .. }) => "negotiation",
            Self::Write(_) => "streaming",
            Self::Storage(_) => "report",
            Self::InvalidState(_) => "controller",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epipe_is_an_underrun() {
        assert_eq!(WriteFault::from_errno(EPIPE, "Broken pipe"), WriteFault::Underrun);
    }

    #[test]
    fn other_errno_is_fatal() {
        // EBADFD, EIO, ESTRPIPE
        for errno in [77, 5, 86] {
            assert_eq!(
                WriteFault::from_errno(errno, "device gone"),
                WriteFault::Fatal("device gone".into())
            );
        }
    }

    #[test]
    fn stages_are_numbered_in_order() {
        let numbers: Vec<u8> = NegotiationStage::ALL.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, (1..=8).collect::<Vec<u8>>());
    }

    #[test]
    fn negotiation_error_names_stage() {
        let err = DeviceError::NegotiationFailed {
            stage: NegotiationStage::Channels,
            reason: "no such config".into(),
        };
        assert_eq!(err.stage(), Some(NegotiationStage::Channels));
        assert!(err.to_string().contains("stage 3 (set channel count)"));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(PlaybackError::Source("missing".into()).exit_code(), 1);
        let header = PlaybackError::from(HeaderError::Truncated { expected: 44, actual: 3 });
        assert_eq!(header.exit_code(), 3);
        assert_eq!(header.stage_name(), "header");
        let device = PlaybackError::from(DeviceError::Unavailable {
            device: "hw:9".into(),
            reason: "no card".into(),
        });
        assert_eq!(device.exit_code(), 4);
        assert_eq!(device.stage_name(), "device open");
    }
}
