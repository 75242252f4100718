//! Hot-reloadable forwarding configuration.
//!
//! The store owns the active [`ForwardingConfig`] behind a reader/writer lock.
//! Readers copy what they need out of the lock and never hold a guard across
//! an `.await`. A reload parses and validates the new file first and only takes
//! the write lock to swap the pointer, so readers observe either the old or the
//! new config in full.

use crate::config::{ConfigLoadError, ForwardingConfig, ParamMap};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use url::Url;

pub struct ConfigStore {
    current: RwLock<Arc<ForwardingConfig>>,
}

impl ConfigStore {
    pub fn new(config: ForwardingConfig) -> Self {
        ConfigStore {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Builds a store from the file at `path`. Used at startup, where a
    /// failure is fatal for the caller.
    pub async fn open(path: &Path) -> Result<Self, ConfigLoadError> {
        tracing::info!(path = %path.display(), "Loading config");
        let config = read_config(path).await?;
        tracing::info!(entries = config.entries.len(), "Config loaded");
        Ok(Self::new(config))
    }

    /// Re-reads `path` and replaces the active config.
    ///
    /// On any error the active config is left as it was. Returns the number
    /// of named configs now active.
    pub async fn load(&self, path: &Path) -> Result<usize, ConfigLoadError> {
        tracing::info!(path = %path.display(), "Loading config");
        let candidate = read_config(path).await?;
        let entries = candidate.entries.len();

        *self.current.write() = Arc::new(candidate);

        tracing::info!(entries, "Config reloaded");
        Ok(entries)
    }

    /// Query parameters of the config called `name`.
    pub fn get(&self, name: &str) -> Option<ParamMap> {
        self.current.read().entries.get(name).cloned()
    }

    pub fn base_url(&self) -> Url {
        self.current.read().base_url.clone()
    }

    /// The active config as a whole. Later reloads do not affect the returned
    /// snapshot.
    pub fn snapshot(&self) -> Arc<ForwardingConfig> {
        self.current.read().clone()
    }

    /// Base URL and parameters of `name`, both taken from the same config
    /// generation.
    pub fn target(&self, name: &str) -> Option<ForwardTarget> {
        let guard = self.current.read();
        let params = guard.entries.get(name)?.clone();

        Some(ForwardTarget {
            base_url: guard.base_url.clone(),
            params,
        })
    }
}

async fn read_config(path: &Path) -> Result<ForwardingConfig, ConfigLoadError> {
    let yaml = tokio::fs::read_to_string(path).await?;
    ForwardingConfig::from_yaml(&yaml)
}

/// Where the alert groups of one request are sent.
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardTarget {
    pub base_url: Url,
    pub params: ParamMap,
}

impl ForwardTarget {
    /// The base URL with the parameters appended as a form-encoded query
    /// string.
    pub fn url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(self.params.iter());
        url
    }
}
