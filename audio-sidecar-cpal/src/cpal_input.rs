//! cpal input capture provider.
//!
//! Opens an enumerated input device and delivers f32 samples via the
//! `AudioBufferCallback`. The cpal stream is not `Send` on every host, so it
//! is built, played and dropped on one dedicated thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, SupportedStreamConfig, SupportedStreamConfigRange};
use parking_lot::Mutex;

use audio_sidecar_core::models::audio_models::{AudioDevice, SAMPLE_RATE};
use audio_sidecar_core::models::error::CaptureError;
use audio_sidecar_core::traits::capture_provider::{AudioBufferCallback, CaptureProvider};

use crate::device_enumerator::CpalDeviceEnumerator;

/// How often the capture thread checks whether it should stop.
const STOP_POLL: Duration = Duration::from_millis(20);

/// Capture from one enumerated input device.
pub struct CpalInputCapture {
    device: AudioDevice,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CpalInputCapture {
    pub fn with_device(device: AudioDevice) -> Self {
        Self {
            device,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
        }
    }
}

impl CaptureProvider for CpalInputCapture {
    fn is_available(&self) -> bool {
        CpalDeviceEnumerator::new().find_device(&self.device).is_ok()
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::ConfigurationFailed(
                "input capture already running".into(),
            ));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let device = self.device.clone();
        let (started_tx, started_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("cpal-input-capture".into())
            .spawn(move || {
                match open_stream(&device, callback) {
                    Ok(stream) => {
                        let _ = started_tx.send(Ok(()));
                        while running.load(Ordering::SeqCst) {
                            thread::sleep(STOP_POLL);
                        }
                        if let Err(e) = stream.pause() {
                            log::debug!("Failed to pause input stream: {}", e);
                        }
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = started_tx.send(Err(e));
                    }
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn capture thread: {}", e)))?;

        let started = started_rx
            .recv()
            .unwrap_or_else(|_| Err(CaptureError::StreamError("capture thread exited early".into())));

        match started {
            Ok(()) => {
                *self.capture_handle.lock() = Some(handle);
                Ok(())
            }
            Err(e) => {
                let _ = handle.join();
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            handle
                .join()
                .map_err(|_| CaptureError::StreamError("capture thread panicked".into()))?;
        }
        Ok(())
    }

    fn device_info(&self) -> AudioDevice {
        self.device.clone()
    }
}

impl Drop for CpalInputCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Open the device and start the stream.
fn open_stream(device: &AudioDevice, callback: AudioBufferCallback) -> Result<cpal::Stream, CaptureError> {
    let cpal_device = CpalDeviceEnumerator::new().find_device(device)?;
    let config = choose_config(&cpal_device)?;
    log::info!(
        "Opening {}: {} Hz, {} channels, {:?}",
        device.name,
        config.sample_rate().0,
        config.channels(),
        config.sample_format()
    );

    let stream = match config.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&cpal_device, &config, callback),
        SampleFormat::I16 => build_stream::<i16>(&cpal_device, &config, callback),
        SampleFormat::U16 => build_stream::<u16>(&cpal_device, &config, callback),
        other => Err(CaptureError::ConfigurationFailed(format!(
            "unsupported sample format {:?}",
            other
        ))),
    }?;

    stream
        .play()
        .map_err(|e| CaptureError::StreamError(format!("failed to start stream: {}", e)))?;
    Ok(stream)
}

/// Prefer a float config at the session rate; fall back to the device default.
fn choose_config(device: &cpal::Device) -> Result<SupportedStreamConfig, CaptureError> {
    let preferred = device
        .supported_input_configs()
        .ok()
        .and_then(|ranges| preferred_config(ranges.collect()));

    match preferred {
        Some(config) => Ok(config),
        None => device
            .default_input_config()
            .map_err(|e| CaptureError::ConfigurationFailed(format!("no usable input config: {}", e))),
    }
}

/// The range covering [`SAMPLE_RATE`] with the fewest channels, F32 first.
fn preferred_config(ranges: Vec<SupportedStreamConfigRange>) -> Option<SupportedStreamConfig> {
    let rate = cpal::SampleRate(SAMPLE_RATE);
    ranges
        .into_iter()
        .filter(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())
        .filter(|r| matches!(r.sample_format(), SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16))
        .min_by_key(|r| (r.sample_format() != SampleFormat::F32, r.channels()))
        .map(|r| r.with_sample_rate(rate))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &SupportedStreamConfig,
    callback: AudioBufferCallback,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let sample_rate = config.sample_rate().0 as f64;
    let channels = config.channels();
    let err_fn = |err| log::error!("Audio stream error: {}", err);
    let mut converted: Vec<f32> = Vec::new();

    device
        .build_input_stream(
            &config.config(),
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                converted.clear();
                converted.extend(data.iter().map(|&s| to_f32(s)));
                callback(&converted, sample_rate, channels);
            },
            err_fn,
            None,
        )
        .map_err(|e| CaptureError::DeviceError(format!("failed to build input stream: {}", e)))
}

fn to_f32<T>(sample: T) -> f32
where
    T: SizedSample,
    f32: FromSample<T>,
{
    sample.to_sample::<f32>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleRate, SupportedBufferSize};

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn prefers_float_mono_at_session_rate() {
        let chosen = preferred_config(vec![
            range(2, 44_100, 48_000, SampleFormat::F32),
            range(1, 8_000, 96_000, SampleFormat::I16),
            range(1, 44_100, 44_100, SampleFormat::F32),
        ])
        .unwrap();
        assert_eq!(chosen.channels(), 1);
        assert_eq!(chosen.sample_format(), SampleFormat::F32);
        assert_eq!(chosen.sample_rate(), SampleRate(44_100));
    }

    #[test]
    fn integer_formats_are_accepted() {
        let chosen = preferred_config(vec![range(2, 8_000, 192_000, SampleFormat::I16)]).unwrap();
        assert_eq!(chosen.sample_format(), SampleFormat::I16);
        assert_eq!(chosen.sample_rate(), SampleRate(44_100));
    }

    #[test]
    fn ranges_without_session_rate_are_skipped() {
        assert!(preferred_config(vec![range(1, 48_000, 48_000, SampleFormat::F32)]).is_none());
        assert!(preferred_config(Vec::new()).is_none());
    }

    #[test]
    fn device_samples_convert_to_float() {
        assert_eq!(to_f32(0.25f32), 0.25);
        assert_eq!(to_f32(0i16), 0.0);
        assert_eq!(to_f32(i16::MIN), -1.0);
        assert_eq!(to_f32(32_768u16), 0.0);
    }

    #[test]
    fn missing_device_fails_to_start() {
        let mut capture = CpalInputCapture::with_device(AudioDevice::named(usize::MAX, "no such device"));
        let callback: AudioBufferCallback = Arc::new(|_: &[f32], _: f64, _: u16| {});
        assert!(capture.start(callback).is_err());
        assert!(!capture.running.load(Ordering::SeqCst));
        assert!(capture.stop().is_ok());
    }
}
