use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for recording session notifications.
///
/// All methods are called from the thread driving the session.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when an error occurs. Capture keeps going where it can.
    fn on_error(&self, error: &CaptureError);

    /// Called when finalization completes, whatever the encoder outcome.
    fn on_capture_finished(&self, result: &RecordingResult);
}
