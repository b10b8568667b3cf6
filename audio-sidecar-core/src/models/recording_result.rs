use std::path::PathBuf;

use serde::Serialize;

use crate::storage::transcoder::TranscodeOutcome;

/// Summary of a finalized session.
///
/// Serialized as one JSON line by the binary so wrapper scripts can pick up
/// the archive path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingResult {
    pub session_id: String,
    pub created_at: String,
    /// Intermediate WAV container handed to the encoder.
    pub wav_path: PathBuf,
    /// SHA-256 of the intermediate WAV.
    pub wav_checksum: String,
    /// Archive the encoder was asked to produce.
    pub output_path: PathBuf,
    pub sample_count: usize,
    pub dropped_samples: u64,
    pub duration_secs: f64,
    pub transcode: TranscodeOutcome,
    /// Copy of the WAV kept next to the output when the encoder did not succeed.
    pub fallback_wav_path: Option<PathBuf>,
}

impl RecordingResult {
    /// Whether the archive file was produced.
    pub fn is_archived(&self) -> bool {
        self.transcode.is_success()
    }
}
