use crate::config::ConfigLoadError;
use crate::config_store::ConfigStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Handles `/reload`: re-reads the config file the process was started with.
pub struct ReloadHandler {
    store: Arc<ConfigStore>,
    config_path: PathBuf,
}

impl ReloadHandler {
    pub fn new(store: Arc<ConfigStore>, config_path: PathBuf) -> Self {
        ReloadHandler { store, config_path }
    }

    /// Returns the number of named configs after the reload. On error the
    /// previous config stays active.
    pub async fn reload(&self) -> Result<usize, ConfigLoadError> {
        tracing::info!("Manual reload triggered via /reload");
        self.store.load(&self.config_path).await.inspect_err(|e| {
            tracing::error!(error = %e, "Manual reload failed");
        })
    }
}
