//! Checker engine contract.
//!
//! The manager drives an engine through `init` / `start` / `stop` /
//! `reset_host_list` and receives state transitions through a
//! `HostStatusHandler`. Engines run their own scan loop on the tokio runtime.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;

use crate::config::UptimeTestsSettings;
use crate::health::hosts::{HostHealthReport, HostList};

/// Tuning passed to an engine on `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerSettings {
    /// Maximum number of concurrent probes.
    pub pool_size: usize,
    /// Consecutive failures before `on_host_down` fires.
    pub failure_trigger_sample_size: u32,
    /// Pause between check rounds.
    pub wait: Duration,
}

impl From<&UptimeTestsSettings> for CheckerSettings {
    fn from(settings: &UptimeTestsSettings) -> Self {
        Self {
            pool_size: settings.checker_pool_size,
            failure_trigger_sample_size: settings.failure_trigger_sample_size,
            wait: settings.wait_duration(),
        }
    }
}

/// Receiver of host state transitions.
///
/// Engines await these calls before moving on, so store writes made here are
/// visible by the time the next round starts.
#[async_trait]
pub trait HostStatusHandler: Send + Sync {
    async fn on_host_down(&self, report: HostHealthReport);
    async fn on_host_back_up(&self, report: HostHealthReport);
}

/// A pollable worker engine.
pub trait CheckerEngine: Send {
    /// (Re)configure the engine. Called before every `start`.
    fn init(
        &mut self,
        settings: CheckerSettings,
        hosts: HostList,
        handler: Arc<dyn HostStatusHandler>,
    );

    /// Start the scan loop. Must be called within a tokio runtime.
    fn start(&mut self);

    /// Request the scan loop to stop. The host list is kept.
    fn stop(&mut self);

    /// Replace the tracked hosts wholesale.
    fn reset_host_list(&mut self, hosts: HostList);

    /// Snapshot of the tracked hosts.
    fn host_list(&self) -> HostList;
}

/// Creates the engine on first leadership acquisition.
pub type EngineFactory = Arc<dyn Fn() -> Box<dyn CheckerEngine> + Send + Sync>;
