//! Shared fixtures for the coordinator integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use uptime_coordinator::config::{ApiDefinition, HostCheckObject, UptimeTests, UptimeTestsConfig};
use uptime_coordinator::events::{ApiRegistry, EventEmitter, EventSink, HostStatusEvent};
use uptime_coordinator::health::{
    CheckerEngine, CheckerSettings, EngineFactory, HostList, HostStatusHandler,
};
use uptime_coordinator::store::{MemoryStore, StorageHandler, StoreError, StoreResult};
use uptime_coordinator::HostCheckerManager;

/// Memory store that records writes and can be told to fail reads.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub fail_reads: AtomicBool,
    pub sets: Mutex<Vec<(String, String, u64)>>,
    pub deletes: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn failing_reads() -> Self {
        let store = Self::default();
        store.fail_reads.store(true, Ordering::SeqCst);
        store
    }

    pub fn sets(&self) -> Vec<(String, String, u64)> {
        self.sets.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageHandler for RecordingStore {
    async fn get_key(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.inner.get_key(key).await
    }

    async fn set_key(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        self.sets
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string(), ttl_secs));
        self.inner.set_key(key, value, ttl_secs).await
    }

    async fn delete_key(&self, key: &str) -> StoreResult<bool> {
        self.deletes.lock().unwrap().push(key.to_string());
        self.inner.delete_key(key).await
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Init { hosts: usize },
    Start,
    Stop,
    Reset { hosts: usize },
}

/// Engine that only records how it is driven.
pub struct MockEngine {
    hosts: HostList,
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl CheckerEngine for MockEngine {
    fn init(&mut self, _: CheckerSettings, hosts: HostList, _: Arc<dyn HostStatusHandler>) {
        self.calls.lock().unwrap().push(EngineCall::Init { hosts: hosts.len() });
        self.hosts = hosts;
    }

    fn start(&mut self) {
        self.calls.lock().unwrap().push(EngineCall::Start);
    }

    fn stop(&mut self) {
        self.calls.lock().unwrap().push(EngineCall::Stop);
    }

    fn reset_host_list(&mut self, hosts: HostList) {
        self.calls.lock().unwrap().push(EngineCall::Reset { hosts: hosts.len() });
        self.hosts = hosts;
    }

    fn host_list(&self) -> HostList {
        self.hosts.clone()
    }
}

/// Collects delivered events.
#[derive(Default)]
pub struct CollectingSink {
    pub events: Mutex<Vec<HostStatusEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<HostStatusEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn handle(&self, event: HostStatusEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn api(id: &str, urls: &[&str]) -> ApiDefinition {
    ApiDefinition {
        api_id: id.to_string(),
        name: format!("{id} API"),
        uptime_tests: UptimeTests {
            check_list: urls.iter().map(|u| HostCheckObject::new(*u)).collect(),
        },
    }
}

/// A manager wired to a mock engine and a collecting sink.
pub struct Harness {
    pub manager: HostCheckerManager,
    pub registry: Arc<ApiRegistry>,
    pub sink: Arc<CollectingSink>,
    pub engine_calls: Arc<Mutex<Vec<EngineCall>>>,
    pub engines_created: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new(store: Arc<dyn StorageHandler>, apis: Vec<ApiDefinition>) -> Self {
        Self::with_config(store, apis, UptimeTestsConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn StorageHandler>,
        apis: Vec<ApiDefinition>,
        config: UptimeTestsConfig,
    ) -> Self {
        let engine_calls = Arc::new(Mutex::new(Vec::new()));
        let engines_created = Arc::new(AtomicUsize::new(0));

        let calls = engine_calls.clone();
        let created = engines_created.clone();
        let factory: EngineFactory = Arc::new(move || -> Box<dyn CheckerEngine> {
            created.fetch_add(1, Ordering::SeqCst);
            Box::new(MockEngine {
                hosts: HostList::new(),
                calls: calls.clone(),
            })
        });

        Self::with_factory(store, apis, config, factory, engine_calls, engines_created)
    }

    pub fn with_factory(
        store: Arc<dyn StorageHandler>,
        apis: Vec<ApiDefinition>,
        config: UptimeTestsConfig,
        factory: EngineFactory,
        engine_calls: Arc<Mutex<Vec<EngineCall>>>,
        engines_created: Arc<AtomicUsize>,
    ) -> Self {
        let registry = Arc::new(ApiRegistry::new(apis));
        let sink = Arc::new(CollectingSink::default());
        let emitter = Arc::new(EventEmitter::spawn(sink.clone(), 64));
        let manager = HostCheckerManager::new(
            Some(store),
            config,
            registry.clone(),
            emitter,
            factory,
        );

        Self {
            manager,
            registry,
            sink,
            engine_calls,
            engines_created,
        }
    }

    pub fn engine_calls(&self) -> Vec<EngineCall> {
        self.engine_calls.lock().unwrap().clone()
    }
}

/// Poll `condition` every 10ms until it holds, panicking after ~5s.
pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
