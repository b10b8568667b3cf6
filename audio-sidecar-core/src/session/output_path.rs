use std::path::{Path, PathBuf};

use crate::models::config::ExistingFileStrategy;

/// Upper bound on the archive path, in bytes.
pub const MAX_PATH_LENGTH: usize = 1024;

/// Bytes reserved for the `-audio.flac` suffix.
const SUFFIX_RESERVE: usize = 11;

/// Prefix used when no path argument is given.
pub const DEFAULT_PREFIX: &str = "/tmp/output";

/// Attempts made by [`ExistingFileStrategy::RenameToLast`] before giving up.
const MAX_RENAME_TRIES: u32 = 100;

/// Derive the output prefix from the optional command-line path.
///
/// The argument is truncated to leave room for the suffix, then scanned from
/// the end towards index 2: a `/` stops the scan, the first `.` found is
/// where the prefix ends. `/foo/bar.wav` gives `/foo/bar`, `/a.b/c` is kept.
pub fn output_prefix(arg: Option<&str>) -> String {
    let Some(arg) = arg else {
        return DEFAULT_PREFIX.to_string();
    };

    let mut len = arg.len().min(MAX_PATH_LENGTH - SUFFIX_RESERVE);
    while !arg.is_char_boundary(len) {
        len -= 1;
    }
    let truncated = &arg[..len];

    let bytes = truncated.as_bytes();
    for i in (2..bytes.len()).rev() {
        match bytes[i] {
            b'/' => break,
            b'.' => return truncated[..i].to_string(),
            _ => {}
        }
    }
    truncated.to_string()
}

/// `<prefix>-audio.<ext>`
pub fn archive_path(prefix: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}-audio.{}", prefix, extension))
}

/// `<prefix>-audio.wav`, where the intermediate WAV is kept if encoding fails.
pub fn fallback_wav_path(prefix: &str) -> PathBuf {
    archive_path(prefix, "wav")
}

/// Apply the existing-file strategy to `<prefix>-audio.<ext>`.
///
/// `RenameToLast` tries `<prefix>-audio2.<ext>`, `<prefix>-audio3.<ext>`, ...
/// and keeps the last candidate if every try is taken.
pub fn resolve_existing(prefix: &str, extension: &str, strategy: ExistingFileStrategy) -> PathBuf {
    let path = archive_path(prefix, extension);
    if !exists(&path) {
        return path;
    }
    log::info!("File exists at \"{}\"", path.display());

    match strategy {
        ExistingFileStrategy::Replace => path,
        ExistingFileStrategy::RenameToLast => {
            let mut candidate = path;
            for n in 2..2 + MAX_RENAME_TRIES {
                candidate = PathBuf::from(format!("{}-audio{}.{}", prefix, n, extension));
                if !exists(&candidate) {
                    return candidate;
                }
            }
            log::error!(
                "Failed to find a free file name in {} tries; replacing {}",
                MAX_RENAME_TRIES,
                candidate.display()
            );
            candidate
        }
    }
}

/// An unreadable location counts as taken.
fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn no_argument_uses_default() {
        assert_eq!(output_prefix(None), "/tmp/output");
    }

    #[test]
    fn extension_is_stripped() {
        assert_eq!(output_prefix(Some("/foo/bar.wav")), "/foo/bar");
        assert_eq!(output_prefix(Some("talk.mp4")), "talk");
    }

    #[test]
    fn path_without_extension_is_kept() {
        assert_eq!(output_prefix(Some("/foo/bar")), "/foo/bar");
    }

    #[test]
    fn only_last_extension_is_stripped() {
        assert_eq!(output_prefix(Some("/foo/bar.tar.gz")), "/foo/bar.tar");
    }

    #[test]
    fn dots_in_directories_are_kept() {
        assert_eq!(output_prefix(Some("/a.b/c")), "/a.b/c");
        assert_eq!(output_prefix(Some("./recording")), "./recording");
    }

    #[test]
    fn leading_characters_are_never_cut() {
        // The scan stops before index 2.
        assert_eq!(output_prefix(Some(".x")), ".x");
        assert_eq!(output_prefix(Some("a.b")), "a.b");
        assert_eq!(output_prefix(Some("ab.c")), "ab");
    }

    #[test]
    fn long_argument_is_truncated() {
        let arg = "a".repeat(2000);
        assert_eq!(output_prefix(Some(&arg)).len(), MAX_PATH_LENGTH - 11);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let arg = "é".repeat(1000);
        let prefix = output_prefix(Some(&arg));
        assert!(prefix.len() <= MAX_PATH_LENGTH - 11);
        assert!(prefix.chars().all(|c| c == 'é'));
    }

    #[test]
    fn archive_and_fallback_names() {
        assert_eq!(archive_path("/foo/bar", "flac"), PathBuf::from("/foo/bar-audio.flac"));
        assert_eq!(fallback_wav_path("/foo/bar"), PathBuf::from("/foo/bar-audio.wav"));
    }

    #[test]
    fn replace_keeps_existing_name() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("talk").to_string_lossy().into_owned();
        fs::write(archive_path(&prefix, "flac"), b"old").unwrap();

        let path = resolve_existing(&prefix, "flac", ExistingFileStrategy::Replace);
        assert_eq!(path, archive_path(&prefix, "flac"));
    }

    #[test]
    fn rename_to_last_picks_first_free_name() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("talk").to_string_lossy().into_owned();
        fs::write(archive_path(&prefix, "flac"), b"1").unwrap();
        fs::write(format!("{}-audio2.flac", prefix), b"2").unwrap();

        let path = resolve_existing(&prefix, "flac", ExistingFileStrategy::RenameToLast);
        assert_eq!(path, PathBuf::from(format!("{}-audio3.flac", prefix)));
    }

    #[test]
    fn free_name_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("fresh").to_string_lossy().into_owned();
        let path = resolve_existing(&prefix, "flac", ExistingFileStrategy::RenameToLast);
        assert_eq!(path, archive_path(&prefix, "flac"));
    }
}
