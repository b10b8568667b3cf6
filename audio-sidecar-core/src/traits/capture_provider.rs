use std::sync::Arc;

use crate::models::audio_models::AudioDevice;
use crate::models::error::CaptureError;

/// Callback invoked when an audio buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of channels (1 = mono, 2 = stereo interleaved).
pub type AudioBufferCallback =
    Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// Interface for an opened input device.
///
/// Implemented by `CpalInputCapture` in the `audio-sidecar-cpal` crate, and
/// by in-memory providers in tests.
pub trait CaptureProvider: Send + Sync {
    /// Whether this capture source is currently available.
    fn is_available(&self) -> bool;

    /// Start capturing audio, delivering buffers via `callback`.
    ///
    /// The callback fires on a dedicated audio thread. It must not block.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), CaptureError>;

    /// Stop capturing and release the stream. Once this returns the
    /// callback is not invoked again.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Information about the audio device backing this provider.
    fn device_info(&self) -> AudioDevice;
}
