/// Console logging through env_logger, with every line optionally copied
/// into a log file once the config names one.
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use env_logger::{Builder, Target};
use log::LevelFilter;
use parking_lot::Mutex;

/// Log sink: stderr, plus the attached file if there is one.
///
/// Clones share the file, so the handle kept by `main` can attach it after
/// the logger has been installed.
#[derive(Clone, Default)]
pub struct TeeWriter {
    file: Arc<Mutex<Option<File>>>,
}

impl TeeWriter {
    /// Append log lines to `path` from now on, creating it if needed.
    pub fn open(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        *self.file.lock() = Some(file);
        Ok(())
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.lock().as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.lock().as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Install env_logger writing through a [`TeeWriter`].
///
/// Returns whether `RUST_LOG` decides the filter (if it does not, the level
/// is capped at info until the config is read) and the writer handle.
pub fn init() -> (bool, TeeWriter) {
    let env_filter = std::env::var_os("RUST_LOG").is_some();
    let tee = TeeWriter::default();
    Builder::new()
        .filter_level(LevelFilter::Trace)
        .parse_default_env()
        .target(Target::Pipe(Box::new(tee.clone())))
        .init();
    if !env_filter {
        log::set_max_level(LevelFilter::Info);
    }
    (env_filter, tee)
}
