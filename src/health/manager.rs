//! Host checker manager.
//!
//! # Responsibilities
//! - Hold this node's poller identity (UUID v4, fixed for the process lifetime)
//! - Elect a single active poller through a lease key in the shared store
//! - Start, stop and reuse the checker engine across leadership changes
//! - Turn engine transitions into sentinel keys and domain events
//! - Answer "is this host down?" for the proxy path
//!
//! # Leadership
//! ```text
//! every poller_tick:
//!     get PollerActiveInstanceID
//!         absent / error  → set(id, lease) → leader
//!         == id           → set(id, lease) → leader (renewal)
//!         other           → follower; stop local engine if running
//!     leader && !polling  → polling = true; spawn start_poller
//! ```
//! The store offers no conditional write, so two nodes can both poll for up
//! to one tick around a lease expiry. Probes and sentinel writes are
//! idempotent, so the overlap only duplicates work.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use uuid::Uuid;

use crate::config::UptimeTestsConfig;
use crate::events::{ApiRegistry, EventEmitter, EventKind, HostStatusEvent};
use crate::health::engine::{CheckerEngine, CheckerSettings, EngineFactory, HostStatusHandler};
use crate::health::hosts::{
    build_host_list, extract_host_name, host_sentinel_key, into_host_list, HostData,
    HostHealthReport, HostList, HOST_SENTINEL_VALUE, POLLER_CACHE_KEY,
};
use crate::lifecycle::StopSignal;
use crate::observability::metrics;
use crate::store::StorageHandler;

/// Coordinates uptime checks across gateway nodes.
///
/// Cheap to clone; every clone drives the same manager.
#[derive(Clone)]
pub struct HostCheckerManager {
    inner: Arc<Inner>,
}

struct Inner {
    id: String,
    store: Option<Arc<dyn StorageHandler>>,
    config: UptimeTestsConfig,
    registry: Arc<ApiRegistry>,
    transitions: Arc<TransitionHandler>,
    engine_factory: EngineFactory,
    checker: Mutex<CheckerSlot>,
    poller_started: AtomicBool,
    stop: StopSignal,
    election: StdMutex<Option<JoinHandle<()>>>,
}

/// The engine, once created, and the host list waiting for it until then.
#[derive(Default)]
struct CheckerSlot {
    engine: Option<Box<dyn CheckerEngine>>,
    pending: Option<HostList>,
}

impl HostCheckerManager {
    /// Create the manager. A `None` store disables polling for this node.
    pub fn new(
        store: Option<Arc<dyn StorageHandler>>,
        config: UptimeTestsConfig,
        registry: Arc<ApiRegistry>,
        emitter: Arc<EventEmitter>,
        engine_factory: EngineFactory,
    ) -> Self {
        let id = Uuid::new_v4().to_string();

        match &store {
            Some(store) => tracing::info!(
                instance_id = %id,
                backend = store.backend_name(),
                "Host checker manager initialised"
            ),
            None => tracing::error!(
                instance_id = %id,
                "No storage instance set for uptime tests, disabling poller"
            ),
        }

        let transitions = Arc::new(TransitionHandler {
            store: store.clone(),
            registry: registry.clone(),
            emitter,
            sentinel_ttl_secs: config.config.time_wait,
        });

        Self {
            inner: Arc::new(Inner {
                id,
                store,
                config,
                registry,
                transitions,
                engine_factory,
                checker: Mutex::new(CheckerSlot::default()),
                poller_started: AtomicBool::new(false),
                stop: StopSignal::new(),
                election: StdMutex::new(None),
            }),
        }
    }

    /// This node's poller identity.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Whether this node believes it is running the checker.
    pub fn is_polling(&self) -> bool {
        self.inner.poller_started.load(Ordering::SeqCst)
    }

    /// Spawn the leader election loop. Returns false when polling is disabled.
    pub fn start(&self) -> bool {
        if self.inner.config.disable {
            tracing::info!("Uptime tests disabled");
            return false;
        }
        if self.inner.store.is_none() {
            tracing::error!("No storage instance set for uptime tests, poller not started");
            return false;
        }
        if self.inner.stop.is_stopped() {
            tracing::warn!("Host checker manager already stopped");
            return false;
        }

        let mut election = lock(&self.inner.election);
        if election.is_some() {
            return true;
        }

        let wake = self.inner.stop.subscribe();
        let inner = self.inner.clone();
        *election = Some(tokio::spawn(check_active_poller_loop(inner, wake)));
        tracing::info!(
            instance_id = %self.inner.id,
            tick_secs = self.inner.config.config.poller_tick_secs,
            "Leader election loop started"
        );
        true
    }

    /// Stop electing, stop the local checker and drain pending events.
    pub async fn stop(&self) {
        if self.inner.stop.trigger() {
            tracing::info!(instance_id = %self.inner.id, "Host checker manager stopping");
        }

        let election = lock(&self.inner.election).take();
        if let Some(handle) = election {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Leader election loop terminated abnormally");
            }
        }

        self.stop_poller().await;
        self.inner.transitions.emitter.shutdown().await;
    }

    /// One leadership check. Returns whether this node is the active poller.
    pub async fn check_active_poller(&self) -> bool {
        self.inner.check_active_poller().await
    }

    /// Read (and renew or claim) the leadership lease.
    pub async fn am_i_polling(&self) -> bool {
        self.inner.am_i_polling().await
    }

    /// Create or reuse the engine and start its scan loop.
    pub async fn start_poller(&self) {
        self.inner.poller_started.store(true, Ordering::SeqCst);
        self.inner.start_poller().await;
    }

    /// Stop the engine, keeping it and its host list for a later start.
    pub async fn stop_poller(&self) {
        self.inner.poller_started.store(false, Ordering::SeqCst);
        self.inner.stop_poller().await;
    }

    /// Replace the tracked hosts. Duplicate check URLs collapse, last wins.
    ///
    /// Before the engine exists the list is held and seeds the engine that the
    /// next `start_poller` creates.
    pub async fn update_tracking_list(&self, hosts: Vec<HostData>) {
        tracing::debug!("Setting tracking list up");
        let list = into_host_list(hosts);

        let mut checker = self.inner.checker.lock().await;
        match checker.engine.as_mut() {
            Some(engine) => {
                tracing::debug!(hosts = list.len(), "Tracking list reset");
                metrics::record_tracked_hosts(list.len());
                engine.reset_host_list(list);
            }
            None => {
                tracing::debug!(hosts = list.len(), "No checker created yet, tracking list held");
                checker.pending = Some(list);
            }
        }
    }

    /// Rebuild the host list from every registered API.
    pub async fn set_checker_host_list(&self) {
        tracing::info!("Loading uptime tests");
        let apis = self.inner.registry.all();
        let hosts = build_host_list(apis.iter().map(Arc::as_ref));
        self.update_tracking_list(hosts).await;
    }

    /// Hosts currently held by the engine, if it exists.
    pub async fn tracked_hosts(&self) -> Option<HostList> {
        self.inner
            .checker
            .lock()
            .await
            .engine
            .as_ref()
            .map(|engine| engine.host_list())
    }

    pub async fn on_host_down(&self, report: HostHealthReport) {
        self.inner.transitions.on_host_down(report).await;
    }

    pub async fn on_host_back_up(&self, report: HostHealthReport) {
        self.inner.transitions.on_host_back_up(report).await;
    }

    /// Whether the host of `url` is marked down. Fails open.
    pub async fn is_host_down(&self, url: &str) -> bool {
        let Some(store) = &self.inner.store else {
            return false;
        };

        let key = host_sentinel_key(&extract_host_name(url));
        tracing::debug!(key = %key, "Checking host sentinel");
        match store.get_key(&key).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Sentinel lookup failed, assuming host is up");
                false
            }
        }
    }
}

impl Inner {
    async fn check_active_poller(self: &Arc<Self>) -> bool {
        let leader = self.am_i_polling().await;

        if leader {
            if !self.poller_started.swap(true, Ordering::SeqCst) {
                let inner = self.clone();
                tokio::spawn(async move { inner.start_poller().await });
            }
        } else if self.poller_started.swap(false, Ordering::SeqCst) {
            tracing::info!(instance_id = %self.id, "New primary found, stopping uptime tests");
            self.stop_poller().await;
        }

        metrics::record_leadership(leader);
        leader
    }

    async fn am_i_polling(&self) -> bool {
        let Some(store) = &self.store else {
            tracing::error!("No storage instance set for uptime tests, disabling poller");
            return false;
        };

        match store.get_key(POLLER_CACHE_KEY).await {
            Ok(Some(active)) if active == self.id => {
                tracing::debug!("Primary instance set, I am master");
                self.claim_lease(store.as_ref()).await;
                true
            }
            Ok(Some(active)) => {
                tracing::debug!(active_instance = %active, "Another instance is the active poller");
                false
            }
            Ok(None) => {
                tracing::debug!("No primary instance found, assuming control");
                self.claim_lease(store.as_ref()).await;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Lease read failed, assuming control");
                self.claim_lease(store.as_ref()).await;
                true
            }
        }
    }

    async fn claim_lease(&self, store: &dyn StorageHandler) {
        let lease = self.config.config.poller_lease_secs;
        if let Err(e) = store.set_key(POLLER_CACHE_KEY, &self.id, lease).await {
            tracing::warn!(error = %e, "Failed to write poller lease");
        }
    }

    async fn start_poller(&self) {
        let mut checker = self.checker.lock().await;
        // Leadership may have been lost while this start was queued.
        if !self.poller_started.load(Ordering::SeqCst) {
            tracing::debug!("Poller start superseded by leadership loss");
            return;
        }

        tracing::debug!("Initialising checker");
        let pending = checker.pending.take();
        let engine = checker.engine.get_or_insert_with(|| (self.engine_factory)());
        let hosts = pending.unwrap_or_else(|| engine.host_list());
        let host_count = hosts.len();
        let handler: Arc<dyn HostStatusHandler> = self.transitions.clone();
        engine.init(CheckerSettings::from(&self.config.config), hosts, handler);
        engine.start();

        metrics::record_tracked_hosts(host_count);
        tracing::info!(instance_id = %self.id, hosts = host_count, "Uptime checker started");
    }

    async fn stop_poller(&self) {
        if let Some(engine) = self.checker.lock().await.engine.as_mut() {
            engine.stop();
        }
    }
}

async fn check_active_poller_loop(inner: Arc<Inner>, mut wake: broadcast::Receiver<()>) {
    let mut ticker = time::interval(inner.config.config.poller_tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wake.recv() => {}
        }

        if inner.stop.is_stopped() {
            tracing::info!("Stopping uptime tests");
            break;
        }

        inner.check_active_poller().await;
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Writes sentinel keys and raises events for engine transitions.
struct TransitionHandler {
    store: Option<Arc<dyn StorageHandler>>,
    registry: Arc<ApiRegistry>,
    emitter: Arc<EventEmitter>,
    sentinel_ttl_secs: u64,
}

impl TransitionHandler {
    fn emit(&self, kind: EventKind, report: HostHealthReport) {
        let Some(api) = self.registry.get(report.api_id()) else {
            tracing::warn!(
                api_id = %report.api_id(),
                event = kind.as_str(),
                "Event can't fire for API that doesn't exist"
            );
            return;
        };
        self.emitter.fire_event(HostStatusEvent::new(kind, &api, report));
    }
}

#[async_trait]
impl HostStatusHandler for TransitionHandler {
    async fn on_host_down(&self, report: HostHealthReport) {
        let key = host_sentinel_key(report.host_name());
        tracing::debug!(key = %key, "Update key");
        if let Some(store) = &self.store {
            if let Err(e) = store.set_key(&key, HOST_SENTINEL_VALUE, self.sentinel_ttl_secs).await {
                tracing::error!(key = %key, error = %e, "Failed to write host down sentinel");
            }
        }

        tracing::warn!(url = %report.check_url, api_id = %report.api_id(), "Host is down");
        metrics::record_host_transition(EventKind::HostDown);
        self.emit(EventKind::HostDown, report);
    }

    async fn on_host_back_up(&self, report: HostHealthReport) {
        let key = host_sentinel_key(report.host_name());
        tracing::debug!(key = %key, "Delete key");
        if let Some(store) = &self.store {
            if let Err(e) = store.delete_key(&key).await {
                tracing::error!(key = %key, error = %e, "Failed to delete host down sentinel");
            }
        }

        tracing::warn!(url = %report.check_url, api_id = %report.api_id(), "Host is back up");
        metrics::record_host_transition(EventKind::HostUp);
        self.emit(EventKind::HostUp, report);
    }
}
