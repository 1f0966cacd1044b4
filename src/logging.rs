//! Diagnostic logging via `tracing`.
//!
//! The terminal belongs to the chat screen, so records go to a file. The
//! level is controlled by `CHATTERM_LOG`:
//!
//! ```bash
//! CHATTERM_LOG=debug chatterm
//! CHATTERM_LOG=chatterm::api=trace chatterm say hello
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "CHATTERM_LOG";
const DEFAULT_FILTER: &str = "chatterm=info,warn";

/// Installs the global subscriber, appending to `log_file` or the default
/// location.
pub fn init(log_file: Option<&Path>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = match log_file {
        Some(path) => path.to_path_buf(),
        None => default_log_path()?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %path.display(),
        "chatterm starting"
    );
    Ok(path)
}

pub fn default_log_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let proj_dirs = ProjectDirs::from("org", "chatterm", "chatterm")
        .ok_or("Failed to determine data directory")?;
    Ok(proj_dirs.data_dir().join("chatterm.log"))
}
