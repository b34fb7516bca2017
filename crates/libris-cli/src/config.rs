use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use libris_store::SqliteOptions;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "libris.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings for a library installation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// SQLite database file.
    pub database: PathBuf,
    /// Directory receipts are written to.
    pub receipts_dir: PathBuf,
    pub write_receipts: bool,
    /// How long to wait for another process holding the database lock.
    pub busy_timeout_ms: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("school_library.db"),
            receipts_dir: PathBuf::from("receipts"),
            write_receipts: true,
            busy_timeout_ms: 5_000,
        }
    }
}

impl LibraryConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), database = %config.database.display(), "loaded config");
        Ok(config)
    }

    /// Load `explicit` if given (it must exist), else `libris.toml` in `cwd`
    /// if present, else the defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = cwd.join(DEFAULT_CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn with_database(mut self, database: Option<PathBuf>) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        self
    }

    pub fn sqlite_options(&self) -> SqliteOptions {
        SqliteOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}
