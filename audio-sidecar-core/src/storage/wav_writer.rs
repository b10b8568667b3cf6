use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::audio_models::StreamSpec;
use crate::models::error::CaptureError;
use crate::processing::wav_format::WavHeader;

/// Write `samples` as a PCM WAV container at `path`, replacing any existing
/// file. Returns the SHA-256 hex digest of the completed file.
///
/// ```text
/// [44-byte WAV header]
/// [16-bit little-endian PCM, one sample per frame]
/// ```
pub fn write_wav(path: &Path, spec: &StreamSpec, samples: &[i16]) -> Result<String, CaptureError> {
    let header = WavHeader::for_samples(spec, samples.len())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
    }

    let file = File::create(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(&header.to_bytes())
        .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(header.to_bytes());
    for chunk in samples.chunks(8192) {
        let bytes: Vec<u8> = chunk.iter().flat_map(|s| s.to_le_bytes()).collect();
        hasher.update(&bytes);
        writer
            .write_all(&bytes)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
    }

    let file = writer
        .into_inner()
        .map_err(|e| CaptureError::StorageError(format!("flush failed: {}", e)))?;
    file.sync_all()
        .map_err(|e| CaptureError::StorageError(format!("sync failed: {}", e)))?;

    log::debug!(
        "Wrote {} samples ({} bytes of PCM) to {}",
        samples.len(),
        header.data_size,
        path.display()
    );
    Ok(hex_encode(&hasher.finalize()))
}

/// Compute SHA-256 hex digest of a file.
#[cfg(test)]
pub(crate) fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data =
        fs::read(path).map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.wav");
        let samples = [0i16, 1, -1, i16::MAX, i16::MIN];

        let checksum = write_wav(&path, &StreamSpec::default(), &samples).unwrap();

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len(), 44 + samples.len() * 2);
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([data[40], data[41], data[42], data[43]]), 10);
        assert_eq!(&data[44..46], &0i16.to_le_bytes());
        assert_eq!(&data[50..52], &i16::MAX.to_le_bytes());
        assert_eq!(checksum, sha256_file(&path).unwrap());
        assert_eq!(checksum.len(), 64);
    }

    #[test]
    fn decodes_with_hound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoded.wav");
        let samples: Vec<i16> = (0..44_100).map(|i| ((i % 200) * 100 - 10_000) as i16).collect();

        write_wav(&path, &StreamSpec::default(), &samples).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn empty_capture_is_a_valid_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, &StreamSpec::default(), &[]).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.wav");
        write_wav(&path, &StreamSpec::default(), &[1, 2]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.wav");
        write_wav(&path, &StreamSpec::default(), &[1; 100]).unwrap();
        write_wav(&path, &StreamSpec::default(), &[2; 3]).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 6);
    }
}
