//! Logging init: file under the XDG state dir, or stderr as a fallback.
//! Stdout carries host replies and must stay clean.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "xdm-relay.log";

fn default_directives(debug: bool) -> &'static str {
    if debug {
        "info,xdm_relay=debug"
    } else {
        "info"
    }
}

/// `RUST_LOG` wins; otherwise the debug preference picks the level.
fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(debug)))
}

/// Open the log for appending, creating `dir` first.
fn open_log(dir: &Path) -> io::Result<(PathBuf, fs::File)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE);
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Log to `~/.local/state/xdm-relay/xdm-relay.log` and return its path.
/// Fails when the state dir is unwritable; callers fall back to stderr.
pub fn init_logging(debug: bool) -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("xdm-relay")?;
    let (path, file) = open_log(&dirs.get_state_home())?;

    // Events are serialized through the lock, one line at a time.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(path)
}

pub fn init_logging_stderr(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}
