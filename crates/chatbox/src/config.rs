//! Application configuration.
//!
//! Layers, lowest to highest: built-in defaults, the TOML config file, then
//! `CHATBOX__SECTION__KEY` environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::db::DATABASE_FILE;
use crate::genai::{DEFAULT_BASE_URL, GeminiOptions};

pub const APP_NAME: &str = "chatbox";

/// Front-end shipped with the crate, usable from any working directory.
pub const BUNDLED_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    pub genai: GenAiConfig,
}

impl AppConfig {
    /// Load the configuration, layering `config_file` and the environment
    /// over the defaults. A missing file is not an error.
    pub fn load(config_file: &Path) -> Result<Self> {
        let defaults = Self::default();
        let built = Config::builder()
            .set_default("server.host", defaults.server.host.as_str())?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("logging.level", defaults.logging.level.as_str())?
            .add_source(
                File::from(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(env_prefix().as_str()).separator("__"))
            .build()
            .with_context(|| format!("loading config from {}", config_file.display()))?;

        built
            .try_deserialize()
            .context("deserializing configuration")
    }

    /// Directory holding the database file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match self.paths.data_dir.as_deref() {
            Some(dir) => expand_str_path(dir),
            None => default_data_dir(),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DATABASE_FILE))
    }

    pub fn static_dir(&self) -> Result<PathBuf> {
        expand_str_path(&self.paths.static_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Overrides the XDG data directory.
    pub data_dir: Option<String>,
    /// Front-end files served at `/` and `/static`.
    pub static_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            static_dir: BUNDLED_STATIC_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Hosted model API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenAiConfig {
    pub base_url: String,
    /// When unset, `GEMINI_API_KEY` then `GOOGLE_API_KEY` are used.
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Delay between polls of a long-running agent job.
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    /// Set to false to make every non-agent turn stateless.
    pub interactions_enabled: bool,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: 120,
            poll_interval_secs: 10,
            max_poll_attempts: 180,
            interactions_enabled: true,
        }
    }
}

impl GenAiConfig {
    pub fn client_options(&self) -> GeminiOptions {
        GeminiOptions {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_poll_attempts: self.max_poll_attempts,
            interactions_enabled: self.interactions_enabled,
        }
    }
}

/// Write the default configuration to `path`, creating parent directories.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {parent:?}"))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config to TOML")?;
    let mut body = format!("# Configuration for {APP_NAME}\n# File: {}\n\n", path.display());
    body.push_str(&toml);
    fs::write(path, body).with_context(|| format!("writing config file to {}", path.display()))
}

pub fn expand_path(path: PathBuf) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        expand_str_path(text)
    } else {
        Ok(path)
    }
}

pub fn expand_str_path(text: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(text).context("expanding path")?;
    Ok(PathBuf::from(expanded.to_string()))
}

pub fn default_config_file() -> Result<PathBuf> {
    Ok(default_config_dir()?.join("config.toml"))
}

pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(dir) = dirs::config_dir() {
        return Ok(dir.join(APP_NAME));
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(dir) = dirs::data_dir() {
        return Ok(dir.join(APP_NAME));
    }

    dirs::home_dir()
        .map(|home| home.join(".local").join("share").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine data directory"))
}

/// Prefix of configuration environment variables.
pub fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
