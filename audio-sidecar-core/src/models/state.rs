use super::error::CaptureError;
use super::recording_result::RecordingResult;

/// Session lifecycle.
///
/// State transitions:
/// ```text
/// initializing → capturing ↔ paused
///                    ↓         ↓
///                  finalizing → completed / failed
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Initializing,
    Capturing { duration_secs: f64 },
    Paused { duration_secs: f64 },
    Finalizing,
    Completed(Box<RecordingResult>),
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_initializing(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Short lowercase name, used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Capturing { .. } => "capturing",
            Self::Paused { .. } => "paused",
            Self::Finalizing => "finalizing",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }
}
