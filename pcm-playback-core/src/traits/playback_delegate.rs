use crate::models::error::PlaybackError;
use crate::models::playback_result::PlaybackReport;
use crate::models::state::PlaybackState;

/// Event delegate for playback notifications.
///
/// All methods are called synchronously from the playback thread, so keep
/// them cheap. Each method has an empty default.
pub trait PlaybackDelegate {
    /// Called after every state transition.
    fn on_state_changed(&self, _state: PlaybackState) {}

    /// Called after an underrun was detected and the device was reset.
    fn on_underrun(&self, _chunk_index: u64) {}

    /// Called when playback aborts on a fatal error.
    fn on_error(&self, _error: &PlaybackError) {}

    /// Called once the device is closed after a successful run.
    fn on_playback_finished(&self, _report: &PlaybackReport) {}
}
