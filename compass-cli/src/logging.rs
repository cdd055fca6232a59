//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured level. Logs go to stderr and, when
//! `[logging] file` is set, through a non-blocking appender to a plain-text
//! file. A file larger than `max_size_mb` is moved to `<file>.1` before the
//! appender opens it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use compass_runner::config::LoggingSection;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. The returned guard flushes the file
/// writer on drop and must be held until the program exits.
pub fn init(section: &LoggingSection, quiet: bool) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(if quiet { "warn" } else { section.level.as_str() }))
        .with_context(|| format!("invalid log level '{}'", section.level))?;

    let (file_layer, guard) = match &section.file {
        Some(path) => {
            rotate_if_oversized(path, section.max_size_mb)?;
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(guard)
}

/// Non-blocking writer appending to `path`.
pub fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .with_context(|| format!("log path has no file name: {}", path.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("failed to open log file: {}", path.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Path a rotated log is moved to.
pub fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}

/// Move `path` to `<path>.1` if it is larger than `max_size_mb`. Returns
/// whether a rotation happened. A previous `.1` file is replaced.
pub fn rotate_if_oversized(path: &Path, max_size_mb: u64) -> Result<bool> {
    let len = match std::fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return Ok(false),
    };
    if len <= max_size_mb.saturating_mul(1024 * 1024) {
        return Ok(false);
    }
    let target = rotated_path(path);
    std::fs::rename(path, &target)
        .with_context(|| format!("failed to rotate {} to {}", path.display(), target.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn small_log_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compass.log");
        std::fs::write(&path, b"hello\n").unwrap();
        assert!(!rotate_if_oversized(&path, 1).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn oversized_log_is_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compass.log");
        std::fs::write(&path, b"x").unwrap();
        assert!(rotate_if_oversized(&path, 0).unwrap());
        assert!(!path.exists());
        assert_eq!(std::fs::read(rotated_path(&path)).unwrap(), b"x");
    }

    #[test]
    fn missing_log_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!rotate_if_oversized(&dir.path().join("none.log"), 10).unwrap());
    }

    #[test]
    fn rotated_path_appends_suffix() {
        assert_eq!(rotated_path(Path::new("logs/compass.log")), PathBuf::from("logs/compass.log.1"));
    }

    #[test]
    fn file_writer_appends_to_the_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compass.log");
        std::fs::write(&path, b"earlier\n").unwrap();

        let (mut writer, guard) = file_writer(&path).unwrap();
        writer.write_all(b"later\n").unwrap();
        drop(writer);
        drop(guard);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn file_writer_after_rotation_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compass.log");
        std::fs::write(&path, b"old\n").unwrap();
        assert!(rotate_if_oversized(&path, 0).unwrap());

        let (mut writer, guard) = file_writer(&path).unwrap();
        writer.write_all(b"new\n").unwrap();
        drop(writer);
        drop(guard);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
        assert_eq!(std::fs::read_to_string(rotated_path(&path)).unwrap(), "old\n");
    }
}
