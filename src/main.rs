mod api;
mod application;
mod config;
mod domain;
mod host;
mod logging;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use application::Controller;
use config::TomlPreferenceStore;
use host::{CookieJar, Host, TabRegistry};

/// `--config <path>` overrides the XDG config location.
fn config_path_from_args() -> Result<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => match args.next() {
                Some(path) => return Ok(PathBuf::from(path)),
                None => bail!("--config needs a path"),
            },
            other => bail!("unknown argument: {}", other),
        }
    }
    config::config_path()
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path_from_args()?;
    let prefs = config::load_or_init(&path)?;

    match logging::init_logging(prefs.debug) {
        Ok(log_path) => tracing::info!("logging to {}", log_path.display()),
        Err(e) => {
            logging::init_logging_stderr(prefs.debug);
            tracing::warn!("file logging unavailable ({}), using stderr", e);
        }
    }
    tracing::info!(
        "xdm-relay starting (config {}, service {})",
        path.display(),
        prefs.xdm_host
    );

    let cookies = Arc::new(CookieJar::new());
    let tabs = Arc::new(TabRegistry::new());
    let controller = Controller::new(
        &prefs,
        cookies.clone(),
        tabs.clone(),
        Arc::new(TomlPreferenceStore::new(path)),
    );

    Host::new(
        controller,
        cookies,
        tabs,
        Duration::from_secs(prefs.sync_period_secs.max(1)),
    )
    .run()
    .await
}
