//! Configuration management for the DataPulse client.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::Audience;

/// Default API base URL (the hosted DataPulse backend).
pub const DEFAULT_API_BASE: &str = "https://api.datapulse.app";

/// Default request timeout in seconds for small API calls.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Default timeout in seconds for the analyze upload (file transfer plus
/// server-side profiling time).
pub const DEFAULT_UPLOAD_TIMEOUT: u64 = 180;

/// Config filename inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Credentials cache filename inside the config directory.
pub const CREDENTIALS_FILENAME: &str = "credentials.toml";

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}
fn default_upload_timeout() -> u64 {
    DEFAULT_UPLOAD_TIMEOUT
}
fn default_business_goal() -> String {
    "improve profitability".to_string()
}
fn default_audience() -> Audience {
    Audience::Executive
}
fn default_user_agent() -> String {
    format!("datapulse-cli/{}", env!("CARGO_PKG_VERSION"))
}

/// Client settings, loaded from the config file with environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the analytics backend.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds for session/usage/summary calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Request timeout in seconds for the analyze upload.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout: u64,
    /// Default business goal sent with the AI summary request.
    #[serde(default = "default_business_goal")]
    pub business_goal: String,
    /// Default audience for the AI summary.
    #[serde(default = "default_audience")]
    pub audience: Audience,
    /// User agent for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Directory holding config and cached credentials.
    /// Resolved at load time; not read from the file itself.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/.config/datapulse (platform equivalent).
        // Falls back gracefully: config dir -> home dir -> current dir.
        let config_dir = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("datapulse");

        Self {
            api_base: default_api_base(),
            request_timeout: default_request_timeout(),
            upload_timeout: default_upload_timeout(),
            business_goal: default_business_goal(),
            audience: default_audience(),
            user_agent: default_user_agent(),
            config_dir,
        }
    }
}

impl Settings {
    /// Create settings rooted at a custom config directory.
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self {
            config_dir,
            ..Default::default()
        }
    }

    /// Load settings: explicit path if given, otherwise the default config
    /// file if present, otherwise defaults. Environment overrides apply last.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match config_path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Failed to read config '{}': {}", path.display(), e)
                })?;
                let mut s: Settings = toml::from_str(&text).map_err(|e| {
                    anyhow::anyhow!("Failed to parse config '{}': {}", path.display(), e)
                })?;
                s.config_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                s
            }
            None => {
                let defaults = Settings::default();
                let candidate = defaults.config_path();
                if candidate.exists() {
                    let text = fs::read_to_string(&candidate)?;
                    let mut s: Settings = toml::from_str(&text).map_err(|e| {
                        anyhow::anyhow!("Failed to parse config '{}': {}", candidate.display(), e)
                    })?;
                    s.config_dir = defaults.config_dir;
                    s
                } else {
                    defaults
                }
            }
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply environment variable overrides (highest precedence).
    fn apply_env_overrides(&mut self) {
        if let Some(base) = std::env::var("DATAPULSE_API_BASE")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.api_base = base;
        }
        if let Some(timeout) = std::env::var("DATAPULSE_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.request_timeout = timeout;
        }
    }

    /// Full path of the config file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILENAME)
    }

    /// Full path of the cached credentials file.
    pub fn credentials_path(&self) -> PathBuf {
        self.config_dir.join(CREDENTIALS_FILENAME)
    }

    /// Ensure the config directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.config_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create config directory '{}': {}",
                    self.config_dir.display(),
                    e
                ),
            )
        })
    }

    /// Write the current settings out as the config file.
    pub fn write_config(&self) -> anyhow::Result<PathBuf> {
        self.ensure_directories()?;
        let path = self.config_path();
        let text = toml::to_string_pretty(self)?;
        fs::write(&path, text)?;
        Ok(path)
    }
}
