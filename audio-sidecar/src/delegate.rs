use audio_sidecar_core::{CaptureDelegate, CaptureError, CaptureState, RecordingResult};

/// CaptureDelegate that reports session events through the log.
pub struct LogDelegate;

impl CaptureDelegate for LogDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        match state {
            CaptureState::Paused { duration_secs } => log::info!("Paused at {:.1}s", duration_secs),
            CaptureState::Capturing { duration_secs } if *duration_secs > 0.0 => {
                log::info!("Resumed at {:.1}s", duration_secs)
            }
            other => log::debug!("Session is {}", other.name()),
        }
    }

    fn on_error(&self, error: &CaptureError) {
        log::error!("{}", error);
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        if result.is_archived() {
            log::info!("Saved \"{}\"", result.output_path.display());
        } else if let Some(ref fallback) = result.fallback_wav_path {
            log::warn!("Archive not produced; WAV kept at \"{}\"", fallback.display());
        } else {
            log::error!("Archive not produced and no WAV could be kept");
        }
    }
}
