/// WAV file format utilities.
///
/// Builds the standard 44-byte RIFF header for a PCM stream whose sample
/// count is already known, so the header is written once and never patched.
use crate::models::audio_models::StreamSpec;
use crate::models::error::CaptureError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Largest data chunk whose RIFF size (`36 + data_size`) still fits in a u32.
pub const MAX_DATA_SIZE: u32 = u32::MAX - 36;

/// Most destination samples of `spec` a single WAV file can describe.
pub fn max_wav_samples(spec: &StreamSpec) -> usize {
    (MAX_DATA_SIZE / spec.bytes_per_sample() as u32) as usize
}

/// Header fields of a PCM WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF chunk size: total file size minus 8.
    pub file_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Bytes of sample data following the header.
    pub data_size: u32,
}

impl WavHeader {
    /// Header for `sample_count` destination samples of `spec`.
    ///
    /// Fails when the data would not fit the 32-bit RIFF size fields.
    pub fn for_samples(spec: &StreamSpec, sample_count: usize) -> Result<Self, CaptureError> {
        let data_size = (sample_count as u64)
            .checked_mul(spec.bytes_per_sample() as u64)
            .and_then(|bytes| u32::try_from(bytes).ok())
            .filter(|&bytes| bytes <= MAX_DATA_SIZE)
            .ok_or_else(|| {
                CaptureError::StorageError(format!(
                    "{} samples exceed the WAV size limit of {}",
                    sample_count,
                    max_wav_samples(spec)
                ))
            })?;
        Ok(Self {
            file_size: 36 + data_size,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            byte_rate: spec.byte_rate(),
            block_align: spec.block_align(),
            bits_per_sample: spec.bits_per_sample(),
            data_size,
        })
    }

    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut header = generate_wav_header(
            self.sample_rate,
            self.bits_per_sample,
            self.channels,
            self.data_size,
        );
        header[4..8].copy_from_slice(&self.file_size.to_le_bytes());
        header
    }
}

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * channels as u32 * bit_depth as u32 / 8;
    let block_align = channels * bit_depth / 8;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(header: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([header[offset], header[offset + 1], header[offset + 2], header[offset + 3]])
    }

    fn u16_at(header: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([header[offset], header[offset + 1]])
    }

    #[test]
    fn header_magic_and_pcm_format() {
        let header = WavHeader::for_samples(&StreamSpec::default(), 0).unwrap().to_bytes();
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32_at(&header, 16), 16);
        assert_eq!(u16_at(&header, 20), 1);
    }

    #[test]
    fn mono_16bit_at_44k1() {
        let header = WavHeader::for_samples(&StreamSpec::default(), 4410).unwrap().to_bytes();
        assert_eq!(u16_at(&header, 22), 1);
        assert_eq!(u32_at(&header, 24), 44_100);
        assert_eq!(u32_at(&header, 28), 88_200);
        assert_eq!(u16_at(&header, 32), 2);
        assert_eq!(u16_at(&header, 34), 16);
        assert_eq!(u32_at(&header, 40), 8820);
        assert_eq!(u32_at(&header, 4), 36 + 8820);
    }

    #[test]
    fn sizes_follow_sample_count() {
        let spec = StreamSpec::default();
        for &cursor in &[0usize, 1, 99, 44_100, 44_100 * 60 * 60] {
            let header = WavHeader::for_samples(&spec, cursor).unwrap();
            let data = cursor as u64 * 2;
            assert_eq!(header.data_size as u64, data, "cursor={cursor}");
            // RIFF size is total file size minus the 8-byte chunk preamble.
            assert_eq!(header.file_size as u64, WAV_HEADER_SIZE as u64 + data - 8);
        }
    }

    #[test]
    fn largest_representable_recording() {
        let spec = StreamSpec::default();
        let max = max_wav_samples(&spec);
        assert_eq!(max, 2_147_483_629);

        let header = WavHeader::for_samples(&spec, max).unwrap();
        assert_eq!(header.data_size as u64, max as u64 * 2);
        assert_eq!(header.file_size, u32::MAX - 1);
    }

    #[test]
    fn oversized_recording_is_rejected() {
        let spec = StreamSpec::default();
        for &cursor in &[max_wav_samples(&spec) + 1, 2_147_483_630, 2_200_000_000] {
            assert!(
                matches!(WavHeader::for_samples(&spec, cursor), Err(CaptureError::StorageError(_))),
                "cursor={cursor}"
            );
        }
    }

    #[test]
    fn generic_header_matches_struct() {
        let from_struct = WavHeader::for_samples(&StreamSpec::default(), 10).unwrap().to_bytes();
        assert_eq!(from_struct, generate_wav_header(44_100, 16, 1, 20));
    }

    #[test]
    fn stereo_header_derives_fields() {
        let header = generate_wav_header(48000, 16, 2, 9600);
        assert_eq!(u32_at(&header, 28), 192_000);
        assert_eq!(u16_at(&header, 32), 4);
    }
}
