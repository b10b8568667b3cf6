/// Fixed capture rate of every session, in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Sample encoding on either side of the stream converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 32-bit float, `[-1.0, 1.0]`, as delivered by the hardware.
    F32,
    /// Signed 16-bit integer, as stored in the session buffer.
    S16,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> u16 {
        match self {
            Self::F32 => 4,
            Self::S16 => 2,
        }
    }
}

/// Source and destination format of the capture stream.
///
/// Immutable for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub source_format: SampleFormat,
    pub destination_format: SampleFormat,
}

impl StreamSpec {
    /// Bytes per destination sample.
    pub fn bytes_per_sample(&self) -> u16 {
        self.destination_format.bytes_per_sample()
    }

    /// Destination bits per sample, as written into the WAV header.
    pub fn bits_per_sample(&self) -> u16 {
        self.bytes_per_sample() * 8
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// Number of destination samples in `secs` seconds of audio.
    pub fn samples_for(&self, secs: f64) -> usize {
        (secs * self.sample_rate as f64 * self.channels as f64).round() as usize
    }

    /// Duration in seconds of `samples` destination samples.
    pub fn duration_of(&self, samples: usize) -> f64 {
        samples as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

impl Default for StreamSpec {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: 1,
            source_format: SampleFormat::F32,
            destination_format: SampleFormat::S16,
        }
    }
}

/// An input device available for capture.
///
/// Enumerated once at startup; `index` is the position in that enumeration
/// and is what a backend uses to reopen the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    pub index: usize,
    pub name: String,
    pub is_default: bool,
    pub default_sample_rate: u32,
    pub channels: u16,
}

impl AudioDevice {
    pub fn named(index: usize, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            is_default: false,
            default_sample_rate: SAMPLE_RATE,
            channels: 1,
        }
    }
}

/// Counters kept by the session for the final summary and debug logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureDiagnostics {
    pub ticks: u64,
    pub samples_pulled: u64,
    pub samples_dropped: u64,
    pub samples_discarded_paused: u64,
    pub converter_overruns: u64,
}
