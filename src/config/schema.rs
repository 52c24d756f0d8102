//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the uptime
//! coordinator. All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the uptime coordinator.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Uptime test (host checker) settings.
    pub uptime_tests: UptimeTestsConfig,

    /// Event delivery settings.
    pub events: EventsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// API definitions carrying the hosts to check.
    pub apis: Vec<ApiDefinition>,
}

/// Uptime test configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct UptimeTestsConfig {
    /// Disable uptime tests entirely on this node.
    pub disable: bool,

    /// Checker and leadership tuning.
    pub config: UptimeTestsSettings,
}

/// Checker and leadership tuning.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct UptimeTestsSettings {
    /// Maximum number of concurrent probes.
    pub checker_pool_size: usize,

    /// Consecutive failures before a host is reported down.
    pub failure_trigger_sample_size: u32,

    /// Seconds between check rounds. Also the expiry of a host's down sentinel.
    pub time_wait: u64,

    /// Seconds between leadership checks.
    pub poller_tick_secs: u64,

    /// Expiry of the leadership lease in seconds.
    pub poller_lease_secs: u64,
}

impl Default for UptimeTestsSettings {
    fn default() -> Self {
        Self {
            checker_pool_size: 50,
            failure_trigger_sample_size: 3,
            time_wait: 10,
            poller_tick_secs: 10,
            poller_lease_secs: 15,
        }
    }
}

impl UptimeTestsSettings {
    /// Interval between check rounds.
    pub fn wait_duration(&self) -> Duration {
        Duration::from_secs(self.time_wait)
    }

    /// Interval between leadership checks.
    pub fn poller_tick(&self) -> Duration {
        Duration::from_secs(self.poller_tick_secs)
    }
}

/// Event delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EventsConfig {
    /// Capacity of the bounded event queue. Events beyond it are dropped.
    pub queue_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// An API served by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ApiDefinition {
    /// Unique API identifier. Events are keyed by it.
    pub api_id: String,

    /// Human readable name.
    #[serde(default)]
    pub name: String,

    /// Upstream hosts to monitor for this API.
    #[serde(default)]
    pub uptime_tests: UptimeTests,
}

/// Per-API uptime test targets.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UptimeTests {
    pub check_list: Vec<HostCheckObject>,
}

/// A single configured check target.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HostCheckObject {
    /// URL to probe (e.g., "http://upstream.internal:3000/health").
    pub url: String,
}

impl HostCheckObject {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
