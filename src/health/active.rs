//! Active uptime checking.
//!
//! # Responsibilities
//! - Periodically probe every tracked host, bounded by the pool size
//! - Track consecutive failures per host (state.rs)
//! - Report transitions to the `HostStatusHandler`
//!
//! The network probe itself is supplied by the caller through `HostProbe`.

use std::sync::Arc;
use std::time::Duration;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::health::engine::{CheckerEngine, CheckerSettings, EngineFactory, HostStatusHandler};
use crate::health::hosts::{HostData, HostHealthReport, HostList};
use crate::health::state::{HostSampleState, Transition};

/// Result of probing one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub healthy: bool,
    pub response_code: Option<u16>,
    pub latency: Duration,
    /// The failure happened below HTTP (connect, reset, timeout).
    pub is_tcp_error: bool,
}

impl ProbeOutcome {
    pub fn up(response_code: u16, latency: Duration) -> Self {
        Self {
            healthy: true,
            response_code: Some(response_code),
            latency,
            is_tcp_error: false,
        }
    }

    pub fn tcp_error(latency: Duration) -> Self {
        Self {
            healthy: false,
            response_code: None,
            latency,
            is_tcp_error: true,
        }
    }
}

/// Reachability probe for a single host.
#[async_trait]
pub trait HostProbe: Send + Sync {
    async fn probe(&self, host: &HostData) -> ProbeOutcome;
}

/// The reference checker engine.
pub struct UptimeChecker {
    probe: Arc<dyn HostProbe>,
    settings: CheckerSettings,
    hosts: Arc<ArcSwap<HostList>>,
    states: Arc<DashMap<String, HostSampleState>>,
    handler: Option<Arc<dyn HostStatusHandler>>,
    shutdown: Option<broadcast::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl UptimeChecker {
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        Self {
            probe,
            settings: CheckerSettings {
                pool_size: 1,
                failure_trigger_sample_size: 1,
                wait: Duration::from_secs(10),
            },
            hosts: Arc::new(ArcSwap::from_pointee(HostList::new())),
            states: Arc::new(DashMap::new()),
            handler: None,
            shutdown: None,
            task: None,
        }
    }

    /// Factory handing a fresh `UptimeChecker` to the manager.
    pub fn factory(probe: Arc<dyn HostProbe>) -> EngineFactory {
        Arc::new(move || -> Box<dyn CheckerEngine> { Box::new(UptimeChecker::new(probe.clone())) })
    }

    /// Whether a scan loop is currently running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl CheckerEngine for UptimeChecker {
    fn init(
        &mut self,
        settings: CheckerSettings,
        hosts: HostList,
        handler: Arc<dyn HostStatusHandler>,
    ) {
        self.settings = settings;
        self.hosts.store(Arc::new(hosts));
        self.states.clear();
        self.handler = Some(handler);
    }

    fn start(&mut self) {
        let Some(handler) = self.handler.clone() else {
            tracing::warn!("Uptime checker started before init, ignoring");
            return;
        };
        if self.is_running() {
            self.stop();
        }

        let (tx, rx) = broadcast::channel(1);
        let scan = ScanLoop {
            probe: self.probe.clone(),
            settings: self.settings.clone(),
            hosts: self.hosts.clone(),
            states: self.states.clone(),
            handler,
        };

        tracing::info!(
            hosts = self.hosts.load().len(),
            pool_size = self.settings.pool_size,
            wait_secs = self.settings.wait.as_secs(),
            "Uptime checker starting"
        );
        self.task = Some(tokio::spawn(scan.run(rx)));
        self.shutdown = Some(tx);
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
            tracing::info!("Uptime checker stopping");
        }
        // A round in flight must not outlive the stop.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn reset_host_list(&mut self, hosts: HostList) {
        self.hosts.store(Arc::new(hosts));
    }

    fn host_list(&self) -> HostList {
        self.hosts.load().as_ref().clone()
    }
}

impl Drop for UptimeChecker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct ScanLoop {
    probe: Arc<dyn HostProbe>,
    settings: CheckerSettings,
    hosts: Arc<ArcSwap<HostList>>,
    states: Arc<DashMap<String, HostSampleState>>,
    handler: Arc<dyn HostStatusHandler>,
}

impl ScanLoop {
    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.settings.wait);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Uptime checker received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.check_all().await;
                }
            }
        }
    }

    async fn check_all(&self) {
        let hosts = self.hosts.load_full();
        // Forget hosts dropped by a reset.
        self.states.retain(|url, _| hosts.contains_key(url));

        stream::iter(hosts.values())
            .for_each_concurrent(self.settings.pool_size.max(1), |host| self.check_host(host))
            .await;
    }

    async fn check_host(&self, host: &HostData) {
        let outcome = self.probe.probe(host).await;

        let transition = {
            let mut state = self.states.entry(host.check_url.clone()).or_default();
            if outcome.healthy {
                state.mark_success()
            } else {
                state.mark_failure(self.settings.failure_trigger_sample_size)
            }
        };

        if !outcome.healthy {
            tracing::debug!(
                url = %host.check_url,
                tcp_error = outcome.is_tcp_error,
                code = ?outcome.response_code,
                "Uptime probe failed"
            );
        }

        let report = HostHealthReport {
            check_url: host.check_url.clone(),
            response_code: outcome.response_code,
            latency_ms: outcome.latency.as_millis() as u64,
            is_tcp_error: outcome.is_tcp_error,
            metadata: host.metadata.clone(),
        };

        match transition {
            Transition::Down => self.handler.on_host_down(report).await,
            Transition::Up => self.handler.on_host_back_up(report).await,
            Transition::None => {}
        }
    }
}
