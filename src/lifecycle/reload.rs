//! Applying configuration reloads to the running coordinator.

use tokio::sync::mpsc;

use crate::config::GatewayConfig;
use crate::events::ApiRegistry;
use crate::health::HostCheckerManager;

/// Swap the API registry and rebuild the tracked host list.
///
/// Checker tuning (pool size, thresholds, intervals) is read at startup and is
/// not changed by a reload.
pub async fn apply_reload(config: GatewayConfig, registry: &ApiRegistry, manager: &HostCheckerManager) {
    registry.replace(config.apis);
    manager.set_checker_host_list().await;
}

/// Apply every update from a `ConfigWatcher` until the channel closes.
pub async fn run_reload_loop(
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
    registry: &ApiRegistry,
    manager: &HostCheckerManager,
) {
    while let Some(config) = updates.recv().await {
        apply_reload(config, registry, manager).await;
    }
    tracing::debug!("Config update channel closed, reload loop exiting");
}
