//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself so that editors
//! and deploy tools that replace the file atomically (write + rename) are seen.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::GatewayConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
    last: Arc<Mutex<Option<GatewayConfig>>>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher seeded with the currently active configuration.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(
        path: &Path,
        current: GatewayConfig,
    ) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (Self {
            path: path.to_path_buf(),
            update_tx,
            last: Arc::new(Mutex::new(Some(current))),
        }, update_rx)
    }

    /// Start watching. The returned watcher must be kept alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let path = self.path.clone();
        let tx = self.update_tx;
        let last = self.last;

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = ?e, "Config watch error");
                    return;
                }
            };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                return;
            }
            let touches_config = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if !touches_config {
                return;
            }

            match reload_if_changed(&path, &last) {
                Ok(Some(config)) => {
                    tracing::info!(path = ?path, apis = config.apis.len(), "Configuration reloaded");
                    let _ = tx.send(config);
                }
                Ok(None) => tracing::debug!(path = ?path, "Config file touched but unchanged"),
                Err(e) => {
                    tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                }
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load the file and return it only when it differs from the last accepted config.
fn reload_if_changed(
    path: &Path,
    last: &Mutex<Option<GatewayConfig>>,
) -> Result<Option<GatewayConfig>, ConfigError> {
    let config = load_config(path)?;
    let mut last = match last.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if last.as_ref() == Some(&config) {
        return Ok(None);
    }
    *last = Some(config.clone());
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_skips_unchanged_file() {
        let path = std::env::temp_dir().join("uptime_coordinator_watcher_test.toml");
        std::fs::write(&path, "[[apis]]\napi_id = \"a\"\n").unwrap();

        let last = Mutex::new(None);
        assert!(reload_if_changed(&path, &last).unwrap().is_some());
        assert!(reload_if_changed(&path, &last).unwrap().is_none());

        std::fs::write(&path, "[[apis]]\napi_id = \"b\"\n").unwrap();
        let updated = reload_if_changed(&path, &last).unwrap().unwrap();
        assert_eq!(updated.apis[0].api_id, "b");

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
