//! # audio-sidecar-core
//!
//! Platform-agnostic core of a mono recording session.
//!
//! Converts device audio to 16-bit mono, accumulates it in a bounded session
//! buffer, computes the live waveform, and on finalization writes a WAV
//! container and hands it to an external encoder. Platform backends implement
//! the `CaptureProvider` trait and plug into `RecordingSession`.
//!
//! ## Architecture
//!
//! ```text
//! audio-sidecar-core (this crate)
//! ├── traits/       ← CaptureProvider, CaptureDelegate, DrawSurface
//! ├── models/       ← CaptureError, CaptureState, SidecarConfig, StreamSpec, AudioDevice, RecordingResult
//! ├── processing/   ← StreamConverter, CaptureBuffer, waveform peaks, WAV header
//! ├── session/      ← RecordingSession, device selection, output path derivation
//! └── storage/      ← WAV writer, encoder invocation, JSON summary
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioDevice, CaptureDiagnostics, SampleFormat, StreamSpec, SAMPLE_RATE};
pub use models::config::{ExistingFileStrategy, MatchPolicy, SidecarConfig};
pub use models::error::CaptureError;
pub use models::recording_result::RecordingResult;
pub use models::state::CaptureState;
pub use processing::capture_buffer::{AppendOutcome, CaptureBuffer};
pub use processing::stream_converter::{ConverterInput, StreamConverter};
pub use processing::waveform::{Bar, Rect, WaveformRenderer};
pub use session::recording::RecordingSession;
pub use storage::transcoder::{EncoderCommand, TranscodeOutcome, Transcoder};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider};
pub use traits::draw_surface::DrawSurface;
