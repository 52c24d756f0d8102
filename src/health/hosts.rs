//! Tracked host records and down-sentinel key derivation.
//!
//! # Responsibilities
//! - Turn configured check targets into `HostData` carrying correlation metadata
//! - Build the full host list from every API in one pass
//! - Derive the store key that marks a host as down
//!
//! # Caveats
//! - The sentinel key uses the hostname only. Two check URLs on the same host
//!   (different port or path) share one down-state.
//! - A malformed URL does not abort the build; the record gets an empty hostname.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ApiDefinition, HostCheckObject};

/// Metadata key holding the raw check URL.
pub const META_TARGET_URL: &str = "target_url";
/// Metadata key holding the owning API id.
pub const META_API_ID: &str = "api_id";
/// Metadata key holding the hostname extracted from the check URL.
pub const META_HOST_NAME: &str = "host_name";

/// Store key holding the identity of the active poller.
pub const POLLER_CACHE_KEY: &str = "PollerActiveInstanceID";
/// Prefix of per-host down sentinel keys.
pub const HOST_SENTINEL_KEY_PREFIX: &str = "PollerCheckerInstance:";
/// Value written to a down sentinel. Only its presence is meaningful.
pub const HOST_SENTINEL_VALUE: &str = "1";

/// Tracked hosts keyed by check URL.
pub type HostList = HashMap<String, HostData>;

/// A host to be checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostData {
    pub check_url: String,
    /// Stable identifier; equal to `check_url`.
    pub id: String,
    pub metadata: HashMap<String, String>,
}

impl HostData {
    pub fn api_id(&self) -> Option<&str> {
        self.metadata.get(META_API_ID).map(String::as_str)
    }

    pub fn host_name(&self) -> Option<&str> {
        self.metadata.get(META_HOST_NAME).map(String::as_str)
    }
}

/// Outcome of a check round for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHealthReport {
    pub check_url: String,
    /// HTTP status returned by the probe, if it got that far.
    pub response_code: Option<u16>,
    pub latency_ms: u64,
    /// The probe failed at the transport layer.
    pub is_tcp_error: bool,
    pub metadata: HashMap<String, String>,
}

impl HostHealthReport {
    /// A report carrying the host's correlation metadata and no probe details.
    pub fn for_host(host: &HostData) -> Self {
        Self {
            check_url: host.check_url.clone(),
            response_code: None,
            latency_ms: 0,
            is_tcp_error: false,
            metadata: host.metadata.clone(),
        }
    }

    pub fn api_id(&self) -> &str {
        self.metadata.get(META_API_ID).map_or("", String::as_str)
    }

    pub fn host_name(&self) -> &str {
        self.metadata.get(META_HOST_NAME).map_or("", String::as_str)
    }
}

/// Extract the hostname (without port) from a URL.
///
/// Returns an empty string, after logging, when the URL cannot be parsed.
pub fn extract_host_name(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => url.host_str().unwrap_or_default().to_string(),
        Err(e) => {
            tracing::error!(url = %raw, error = %e, "Failed to parse check URL");
            String::new()
        }
    }
}

/// Store key marking `host_name` as down.
pub fn host_sentinel_key(host_name: &str) -> String {
    format!("{HOST_SENTINEL_KEY_PREFIX}{host_name}")
}

/// Build the tracked record for one configured check target.
pub fn prepare_tracking_host(check: &HostCheckObject, api_id: &str) -> HostData {
    let host_name = extract_host_name(&check.url);

    let metadata = HashMap::from([
        (META_TARGET_URL.to_string(), check.url.clone()),
        (META_API_ID.to_string(), api_id.to_string()),
        (META_HOST_NAME.to_string(), host_name),
    ]);

    HostData {
        check_url: check.url.clone(),
        id: check.url.clone(),
        metadata,
    }
}

/// Build the host list for every check target of every API.
pub fn build_host_list<'a, I>(apis: I) -> Vec<HostData>
where
    I: IntoIterator<Item = &'a ApiDefinition>,
{
    let mut hosts = Vec::new();
    for api in apis {
        for check in &api.uptime_tests.check_list {
            tracing::info!(api_id = %api.api_id, url = %check.url, "Adding uptime test");
            hosts.push(prepare_tracking_host(check, &api.api_id));
        }
    }
    hosts
}

/// Collapse a host vector into a `HostList`. Later duplicates win.
pub fn into_host_list(hosts: Vec<HostData>) -> HostList {
    hosts
        .into_iter()
        .map(|host| (host.check_url.clone(), host))
        .collect()
}
