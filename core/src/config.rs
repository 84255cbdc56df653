//! Client configuration, read from TOML.
//!
//! Every key is optional; missing keys take the defaults below. The
//! `TODO_API_BASE_URL` environment variable overrides `base_url` after the
//! file is read.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::client::{TodoClient, DEFAULT_BASE_URL};
use crate::clock::Clock;
use crate::debounce::DEFAULT_SEARCH_DEBOUNCE;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::persist::{FileStorage, PersistError};
use crate::store::{StoreOptions, TodoStore};
use crate::sync::RollbackPolicy;

pub const BASE_URL_ENV: &str = "TODO_API_BASE_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub page_size: usize,
    pub load_more_step: usize,
    pub search_debounce_ms: u64,
    /// Where `FileStorage` keeps the collection. `None` means in-memory only.
    pub storage_dir: Option<PathBuf>,
    pub rollback: RollbackPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            load_more_step: DEFAULT_PAGE_SIZE,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64,
            storage_dir: None,
            rollback: RollbackPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Read `path` and apply the environment override.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        config.apply_env_override(std::env::var(BASE_URL_ENV).ok());
        debug!(path = %path.display(), base_url = %config.base_url, "config loaded");
        Ok(config)
    }

    /// Parse and validate a TOML document. No environment lookup.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_override(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".into()));
        }
        if self.load_more_step == 0 {
            return Err(ConfigError::Invalid("load_more_step must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            page_size: self.page_size,
            load_more_step: self.load_more_step,
            search_debounce: Duration::from_millis(self.search_debounce_ms),
        }
    }

    pub fn client(&self) -> TodoClient {
        TodoClient::new(&self.base_url)
    }

    /// File storage under `storage_dir`, created if missing. `None` when no
    /// directory is configured.
    pub fn storage(&self) -> Result<Option<FileStorage>, PersistError> {
        self.storage_dir.clone().map(FileStorage::open).transpose()
    }

    /// A store with the configured tunables, rehydrated from `storage` when
    /// one is configured and holds a collection.
    pub fn open_store(&self, clock: Arc<dyn Clock>) -> Result<TodoStore, PersistError> {
        let mut store = TodoStore::with_options(clock, self.store_options());
        if let Some(storage) = self.storage()? {
            store.load(&storage)?;
        }
        Ok(store)
    }
}
