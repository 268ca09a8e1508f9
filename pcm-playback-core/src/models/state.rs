use serde::{Deserialize, Serialize};

/// Playback lifecycle state machine.
///
/// State transitions:
/// ```text
/// opened → negotiated → streaming → draining → closed
///    │          │           │                    ↑
///    └──────────┴───────────┴── (fatal) ─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Opened,
    Negotiated,
    Streaming,
    Draining,
    Closed,
}

impl PlaybackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether `next` is a legal successor of this state.
    ///
    /// Any non-terminal state may jump straight to `Closed` on a fatal
    /// error; `Draining` is entered only from `Streaming`.
    pub fn can_transition_to(&self, next: PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, next),
            (Opened, Negotiated)
                | (Negotiated, Streaming)
                | (Streaming, Draining)
                | (Opened | Negotiated | Streaming | Draining, Closed)
        )
    }
}
