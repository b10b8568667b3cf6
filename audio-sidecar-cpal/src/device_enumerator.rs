//! Input device enumeration through the cpal default host.
//!
//! Devices are listed once at startup. A device is identified by its
//! position in that listing plus its name; reopening checks both.

use cpal::traits::{DeviceTrait, HostTrait};

use audio_sidecar_core::models::audio_models::AudioDevice;
use audio_sidecar_core::models::error::CaptureError;

/// Audio device enumerator over the platform's default cpal host.
pub struct CpalDeviceEnumerator {
    host: cpal::Host,
}

impl CpalDeviceEnumerator {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Name of the audio backend, e.g. `ALSA` or `WASAPI`.
    pub fn host_name(&self) -> &'static str {
        self.host.id().name()
    }

    /// List input devices, logging each one.
    ///
    /// Fails only when the host itself cannot enumerate; a device whose
    /// name or default config cannot be read is listed with placeholders.
    pub fn list_capture_devices(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        let default_name = self
            .host
            .default_input_device()
            .and_then(|d| d.name().ok());

        let devices = self
            .host
            .input_devices()
            .map_err(|e| CaptureError::DeviceError(format!("failed to enumerate input devices: {}", e)))?;

        let mut listed = Vec::new();
        for (index, device) in devices.enumerate() {
            let name = device
                .name()
                .unwrap_or_else(|_| format!("Unknown Device {}", index));
            let (channels, default_sample_rate) = device
                .default_input_config()
                .map(|config| (config.channels(), config.sample_rate().0))
                .unwrap_or((0, 0));
            let is_default = default_name.as_deref() == Some(name.as_str());

            log::info!(
                "device[{}] name: {} ({} ch, {} Hz{})",
                index,
                name,
                channels,
                default_sample_rate,
                if is_default { ", default" } else { "" }
            );

            listed.push(AudioDevice {
                index,
                name,
                is_default,
                default_sample_rate,
                channels,
            });
        }

        if listed.is_empty() {
            log::warn!("No input devices found on host {}", self.host_name());
        }
        Ok(listed)
    }

    /// Reopen an enumerated device.
    pub fn find_device(&self, wanted: &AudioDevice) -> Result<cpal::Device, CaptureError> {
        let mut devices = self
            .host
            .input_devices()
            .map_err(|e| CaptureError::DeviceError(format!("failed to enumerate input devices: {}", e)))?;

        devices
            .nth(wanted.index)
            .filter(|device| device.name().map(|n| n == wanted.name).unwrap_or(false))
            .ok_or(CaptureError::DeviceNotAvailable)
    }
}

impl Default for CpalDeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_indices_follow_listing_order() {
        // Machines without audio hardware may list nothing or fail to enumerate.
        let enumerator = CpalDeviceEnumerator::new();
        if let Ok(devices) = enumerator.list_capture_devices() {
            for (position, device) in devices.iter().enumerate() {
                assert_eq!(device.index, position);
            }
        }
    }

    #[test]
    fn unknown_device_is_not_available() {
        let enumerator = CpalDeviceEnumerator::new();
        let missing = AudioDevice::named(usize::MAX, "no such device");
        assert!(enumerator.find_device(&missing).is_err());
    }
}
