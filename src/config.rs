use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_XDM_HOST;
use crate::application::PreferenceStore;
use crate::domain::RelayError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Preferences loaded from `~/.config/xdm-relay/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Base URL of the download manager's local endpoint.
    pub xdm_host: String,
    /// User paused relaying.
    pub disabled: bool,
    /// Verbose logging, including swallowed relay failures.
    pub debug: bool,
    /// Seconds between `/sync` polls.
    pub sync_period_secs: u64,
    /// Tracked requests older than this are purged on each sync tick.
    pub request_ttl_secs: u64,
    /// Reported to the service as `realUA`.
    pub user_agent: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            xdm_host: DEFAULT_XDM_HOST.to_string(),
            disabled: false,
            debug: false,
            sync_period_secs: 60,
            request_ttl_secs: 300,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("xdm-relay")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load preferences from `path`, creating a default file if none exists.
pub fn load_or_init(path: &Path) -> Result<Preferences> {
    if !path.exists() {
        let defaults = Preferences::default();
        write(path, &defaults)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(defaults);
    }

    let data = fs::read_to_string(path)?;
    let prefs: Preferences = toml::from_str(&data)?;
    Ok(prefs)
}

fn write(path: &Path, prefs: &Preferences) -> Result<()> {
    let toml = toml::to_string_pretty(prefs)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    Ok(())
}

/// Preference store backed by the TOML config file.
#[derive(Debug, Clone)]
pub struct TomlPreferenceStore {
    path: PathBuf,
}

impl TomlPreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PreferenceStore for TomlPreferenceStore {
    fn load(&self) -> Result<Preferences, RelayError> {
        load_or_init(&self.path).map_err(|e| RelayError::Preferences(e.to_string()))
    }

    fn set_disabled(&self, disabled: bool) -> Result<(), RelayError> {
        let mut prefs = self.load()?;
        prefs.disabled = disabled;
        write(&self.path, &prefs).map_err(|e| RelayError::Preferences(e.to_string()))
    }
}
