//! Configuration for the issue tracker server.
//!
//! Settings are layered: `issue-tracker.toml` → environment → CLI flags.
//! A missing file yields defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! dev_mode = false
//!
//! [store]
//! backend = "sqlite"
//! path = ".issue-tracker/issues.db"
//! ```
//!
//! # Environment Overrides
//!
//! | Variable                | Setting          |
//! |-------------------------|------------------|
//! | `ISSUE_TRACKER_HOST`    | `server.host`    |
//! | `ISSUE_TRACKER_PORT`    | `server.port`    |
//! | `ISSUE_TRACKER_DB_PATH` | `store.path`     |
//! | `ISSUE_TRACKER_STORE`   | `store.backend`  |

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::TrackerError;

pub const DEFAULT_CONFIG_FILE: &str = "issue-tracker.toml";

/// Where issues are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite document store on disk (default)
    #[default]
    Sqlite,
    /// Volatile in-process store; contents are lost on exit
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!(
                "Invalid store backend '{}'. Valid options: sqlite, memory",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Permissive CORS for a separately served UI during development.
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".issue-tracker/issues.db")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub store: StoreSection,
}

impl TrackerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse issue-tracker.toml")
    }

    /// Load configuration from `path`, or defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize to TOML, as shown by `config show`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Apply `ISSUE_TRACKER_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), TrackerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("ISSUE_TRACKER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ISSUE_TRACKER_PORT") {
            self.server.port = port.parse().map_err(|_| {
                TrackerError::Config(format!("ISSUE_TRACKER_PORT is not a valid port: {}", port))
            })?;
        }
        if let Some(path) = lookup("ISSUE_TRACKER_DB_PATH") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(backend) = lookup("ISSUE_TRACKER_STORE") {
            self.store.backend = backend.parse().map_err(TrackerError::Config)?;
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<(), TrackerError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; an ephemeral port will be chosen".to_string());
        }
        if self.server.host.trim().is_empty() {
            warnings.push("server.host is empty".to_string());
        }
        if self.store.backend == StoreBackend::Sqlite && self.store.path.as_os_str().is_empty() {
            warnings.push("store.path is empty but the sqlite backend is selected".to_string());
        }
        if self.store.backend == StoreBackend::Memory {
            warnings.push("store.backend is memory; issues will not survive a restart".to_string());
        }

        warnings
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
