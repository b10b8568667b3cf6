//! # audio-sidecar-cpal
//!
//! cpal input backend for audio-sidecar.
//!
//! Provides:
//! - `CpalDeviceEnumerator`: input device listing on the default host
//! - `CpalInputCapture`: a `CaptureProvider` over one input device
//!
//! ## Usage
//! ```ignore
//! use audio_sidecar_core::{MatchPolicy, RecordingSession};
//! use audio_sidecar_core::session::device_selector::select_device;
//! use audio_sidecar_cpal::{CpalDeviceEnumerator, CpalInputCapture};
//!
//! let devices = CpalDeviceEnumerator::new().list_capture_devices()?;
//! let device = select_device(&devices, Some("scarlett"), MatchPolicy::LastMatch);
//! let provider = device.cloned().map(CpalInputCapture::with_device);
//! let mut session = RecordingSession::new(config, provider, prefix);
//! ```

pub mod cpal_input;
pub mod device_enumerator;

pub use cpal_input::CpalInputCapture;
pub use device_enumerator::CpalDeviceEnumerator;
