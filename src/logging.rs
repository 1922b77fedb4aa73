//! File-based tracing setup
//!
//! The terminal belongs to the TUI, so logs go to a file. The filter comes
//! from `RUST_LOG` and defaults to `info`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

/// Log file name inside the data directory
const LOG_FILE_NAME: &str = "cityweather.log";

/// Default log path: `~/.local/share/cityweather/cityweather.log` on Linux.
///
/// Returns `None` when no home directory can be determined.
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "cityweather")?;
    Some(project_dirs.data_local_dir().join(LOG_FILE_NAME))
}

/// Opens `path` for appending, creating parent directories as needed
pub fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber writing to `path`.
///
/// Returns the path actually used, or `None` if logging is disabled because
/// no location could be determined.
pub fn init(path: Option<PathBuf>) -> io::Result<Option<PathBuf>> {
    let Some(path) = path.or_else(default_log_path) else {
        return Ok(None);
    };

    let log_file = open_log_file(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();

    Ok(Some(path))
}
