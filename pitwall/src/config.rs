//! Runtime configuration.
//!
//! A small INI file plus command-line overrides. Every setting has a
//! default, so the backend runs with no config file at all.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5221";
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Backend settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the websocket endpoint binds to.
    pub bind_addr: SocketAddr,

    /// Derivation tick period in milliseconds.
    pub tick_interval_ms: u64,

    /// Fuel history JSON file location.
    pub store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("static default address"),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            store_path: default_store_path(),
        }
    }
}

/// `<platform data dir>/pitwall/fuel_history.json`, falling back to the
/// working directory when no data dir is known.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pitwall")
        .join("fuel_history.json")
}

impl Config {
    /// Load settings from an INI file, keeping defaults for absent keys.
    ///
    /// Recognized keys, all in the `[server]` section: `bind`, `tick_ms`,
    /// `store`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Config::default();
        let Some(section) = ini.section(Some("server")) else {
            return Ok(config);
        };
        if let Some(value) = section.get("bind") {
            config.bind_addr = value.parse().map_err(|_| ConfigError::Invalid {
                key: "server.bind",
                value: value.to_string(),
            })?;
        }
        if let Some(value) = section.get("tick_ms") {
            let ms: u64 = value.parse().map_err(|_| ConfigError::Invalid {
                key: "server.tick_ms",
                value: value.to_string(),
            })?;
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    key: "server.tick_ms",
                    value: value.to_string(),
                });
            }
            config.tick_interval_ms = ms;
        }
        if let Some(value) = section.get("store") {
            config.store_path = PathBuf::from(value);
        }
        debug!(?config, "loaded config file");
        Ok(config)
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    pub fn with_store_path(mut self, path: PathBuf) -> Self {
        self.store_path = path;
        self
    }
}
