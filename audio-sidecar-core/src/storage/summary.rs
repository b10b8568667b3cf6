use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;

/// One-line JSON rendering of a finalized session.
pub fn summary_line(result: &RecordingResult) -> Result<String, CaptureError> {
    serde_json::to_string(result)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize summary: {}", e)))
}
