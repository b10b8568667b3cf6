use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioDevice, CaptureDiagnostics, StreamSpec};
use crate::models::config::SidecarConfig;
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::processing::capture_buffer::CaptureBuffer;
use crate::processing::stream_converter::{ConverterInput, StreamConverter};
use crate::processing::wav_format::max_wav_samples;
use crate::session::output_path;
use crate::storage::transcoder::Transcoder;
use crate::storage::wav_writer;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider};

/// Source samples the converter ring can hold between two ticks.
const RING_SECONDS: usize = 8;

/// One recording, from device binding to the archived file.
///
/// Owns everything the process used to keep in globals: the converter, the
/// session buffer, the output prefix and the lifecycle state.
///
/// ```text
/// [Provider thread] → ConverterInput ─ring─ StreamConverter → CaptureBuffer
///                                                 tick() ┘          │
///                              finalize(): WAV → Transcoder → RecordingResult
/// ```
///
/// Everything except the provider callback runs on the thread that calls
/// [`tick`](Self::tick).
pub struct RecordingSession<P: CaptureProvider> {
    config: SidecarConfig,
    spec: StreamSpec,
    prefix: String,
    provider: Option<P>,
    input: Option<ConverterInput>,
    converter: StreamConverter,
    buffer: CaptureBuffer,
    state: CaptureState,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    diagnostics: CaptureDiagnostics,
    overflow_warned: bool,
    chunk_len: usize,
    session_id: String,
    created_at: String,
}

impl<P: CaptureProvider> RecordingSession<P> {
    /// Create a session writing to `<prefix>-audio.<ext>`. Without a
    /// provider the session records nothing and produces an empty file.
    pub fn new(config: SidecarConfig, provider: Option<P>, prefix: String) -> Self {
        let spec = StreamSpec::default();
        let capacity = spec
            .samples_for(config.max_duration_secs)
            .min(max_wav_samples(&spec));
        let ring_capacity = spec.samples_for(RING_SECONDS as f64);
        let (input, converter) = StreamConverter::new(spec, ring_capacity);

        log::debug!(
            "Session buffer holds {} samples ({:.0}s)",
            capacity,
            config.max_duration_secs
        );

        Self {
            config,
            spec,
            prefix,
            provider,
            input: Some(input),
            converter,
            buffer: CaptureBuffer::new(capacity),
            state: CaptureState::Initializing,
            delegate: None,
            diagnostics: CaptureDiagnostics::default(),
            overflow_warned: false,
            chunk_len: spec.sample_rate as usize,
            session_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        CaptureDiagnostics {
            converter_overruns: self.converter.overruns(),
            ..self.diagnostics.clone()
        }
    }

    /// The device bound to this session, if any.
    pub fn device(&self) -> Option<AudioDevice> {
        self.provider.as_ref().map(|p| p.device_info())
    }

    /// Samples accumulated so far (the buffer cursor).
    pub fn sample_count(&self) -> usize {
        self.buffer.cursor()
    }

    /// Seconds of audio accumulated so far.
    pub fn duration_secs(&self) -> f64 {
        self.spec.duration_of(self.buffer.cursor())
    }

    /// The accumulated samples `[0, cursor)`.
    pub fn samples(&self) -> &[i16] {
        self.buffer.samples()
    }

    pub fn bin_peaks(&self, bins: usize) -> Vec<i16> {
        self.buffer.bin_peaks(bins)
    }

    /// Bind the provider to the converter and start the device.
    ///
    /// A device that fails to start is logged and reported to the delegate;
    /// the session still moves to capturing and records silence.
    pub fn start_capture(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_initializing() {
            return Err(CaptureError::ConfigurationFailed(
                "can only start from initializing state".into(),
            ));
        }

        match (self.provider.as_mut(), self.input.take()) {
            (Some(provider), Some(input)) => {
                let device = provider.device_info();
                let input = Arc::new(Mutex::new(input));
                let callback: AudioBufferCallback =
                    Arc::new(move |samples: &[f32], sample_rate: f64, channels: u16| {
                        input.lock().push(samples, sample_rate, channels);
                    });

                match provider.start(callback) {
                    Ok(()) => log::info!("Capturing from device[{}]: {}", device.index, device.name),
                    Err(e) => {
                        log::error!("Couldn't start device {}: {}", device.name, e);
                        self.notify_error(&e);
                        self.provider = None;
                    }
                }
            }
            _ => log::warn!("No input device bound; the recording will be empty"),
        }

        self.set_state(CaptureState::Capturing { duration_secs: 0.0 });
        Ok(())
    }

    /// One accumulation step: pull up to one second of converted audio and
    /// append it. Returns the number of samples appended.
    pub fn tick(&mut self) -> usize {
        if !self.state.is_capturing() && !self.state.is_paused() {
            return 0;
        }
        self.diagnostics.ticks += 1;

        let samples = self.converter.pull(self.chunk_len);
        let written = self.accumulate(&samples);

        if let CaptureState::Capturing { duration_secs } = &mut self.state {
            *duration_secs = self.spec.duration_of(self.buffer.cursor());
        }
        written
    }

    /// Pause capture. Transitions: capturing → paused.
    pub fn pause_capture(&mut self) -> Result<(), CaptureError> {
        let CaptureState::Capturing { duration_secs } = self.state else {
            return Err(CaptureError::ConfigurationFailed(
                "can only pause from capturing state".into(),
            ));
        };
        self.set_state(CaptureState::Paused { duration_secs });
        Ok(())
    }

    /// Resume capture. Transitions: paused → capturing.
    pub fn resume_capture(&mut self) -> Result<(), CaptureError> {
        let CaptureState::Paused { duration_secs } = self.state else {
            return Err(CaptureError::ConfigurationFailed(
                "can only resume from paused state".into(),
            ));
        };
        self.set_state(CaptureState::Capturing { duration_secs });
        Ok(())
    }

    /// Stop the device, drain the converter, write the WAV and run the
    /// encoder. Encoder failure is reported in the result, not as an error;
    /// only failing to write the WAV is.
    pub fn finalize(&mut self) -> Result<RecordingResult, CaptureError> {
        if matches!(self.state, CaptureState::Finalizing) || self.state.is_terminal() {
            return Err(CaptureError::ConfigurationFailed("session already finalized".into()));
        }
        let was_paused = self.state.is_paused();
        self.set_state(CaptureState::Finalizing);

        if let Some(provider) = self.provider.as_mut() {
            if let Err(e) = provider.stop() {
                log::warn!("Failed to stop device cleanly: {}", e);
            }
        }

        self.converter.flush();
        loop {
            let samples = self.converter.pull(self.chunk_len);
            if samples.is_empty() {
                break;
            }
            if was_paused {
                self.diagnostics.samples_discarded_paused += samples.len() as u64;
            } else {
                self.append(&samples);
            }
        }

        let duration_secs = self.duration_secs();
        log::info!(
            "Recorded {} samples ({:.3}s), dropped {}",
            self.buffer.cursor(),
            duration_secs,
            self.diagnostics.samples_dropped
        );

        let wav_path = self.config.temp_wav_path.clone();
        let wav_checksum = match wav_writer::write_wav(&wav_path, &self.spec, self.buffer.samples()) {
            Ok(checksum) => checksum,
            Err(e) => {
                log::error!("Failed to write {}: {}", wav_path.display(), e);
                self.notify_error(&e);
                self.set_state(CaptureState::Failed(e.clone()));
                return Err(e);
            }
        };

        let output_path = output_path::resolve_existing(
            &self.prefix,
            &self.config.output_extension,
            self.config.existing_file_strategy,
        );
        log::info!("Saving audio to \"{}\"", output_path.display());

        let transcoder = Transcoder::new(self.config.encoder.clone(), self.config.encoder_timeout);
        let transcode = transcoder.run(&wav_path, &output_path, self.spec.sample_rate);

        let fallback_wav_path = if transcode.is_success() {
            None
        } else {
            let e = CaptureError::EncodingFailed(format!("{:?}", transcode));
            self.notify_error(&e);
            self.keep_fallback_wav(&wav_path)
        };

        let result = RecordingResult {
            session_id: self.session_id.clone(),
            created_at: self.created_at.clone(),
            wav_path,
            wav_checksum,
            output_path,
            sample_count: self.buffer.cursor(),
            dropped_samples: self.diagnostics.samples_dropped,
            duration_secs,
            transcode,
            fallback_wav_path,
        };

        self.set_state(CaptureState::Completed(Box::new(result.clone())));
        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_finished(&result);
        }
        Ok(result)
    }

    // --- Internal helpers ---

    fn accumulate(&mut self, samples: &[i16]) -> usize {
        self.diagnostics.samples_pulled += samples.len() as u64;
        if self.state.is_paused() {
            self.diagnostics.samples_discarded_paused += samples.len() as u64;
            return 0;
        }
        self.append(samples)
    }

    fn append(&mut self, samples: &[i16]) -> usize {
        let outcome = self.buffer.append(samples);
        if outcome.dropped > 0 {
            self.diagnostics.samples_dropped += outcome.dropped as u64;
            if !self.overflow_warned {
                self.overflow_warned = true;
                log::warn!(
                    "Session buffer full after {:.0}s; newer audio is dropped",
                    self.duration_secs()
                );
            }
        }
        outcome.written
    }

    /// Copy the intermediate WAV to `<prefix>-audio.wav` so the capture
    /// survives a failed encode.
    fn keep_fallback_wav(&self, wav_path: &Path) -> Option<PathBuf> {
        let fallback = output_path::fallback_wav_path(&self.prefix);
        if fallback == wav_path {
            return Some(fallback);
        }
        match fs::copy(wav_path, &fallback) {
            Ok(_) => {
                log::warn!("Encoding failed; kept WAV at \"{}\"", fallback.display());
                Some(fallback)
            }
            Err(e) => {
                log::error!("Failed to keep WAV at {}: {}", fallback.display(), e);
                None
            }
        }
    }

    fn set_state(&mut self, new_state: CaptureState) {
        log::debug!("Session state: {} -> {}", self.state.name(), new_state.name());
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&self.state);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}
