//! Domain events raised by host state transitions.
//!
//! # Data Flow
//! ```text
//! HostCheckerManager (on_host_down / on_host_back_up)
//!     → registry.rs (resolve owning API)
//!     → emitter.rs  (bounded queue, non-blocking enqueue)
//!     → worker task → EventSink
//! ```
//!
//! # Design Decisions
//! - Enqueue never blocks the check loop; a full queue drops the event
//! - One delivery worker; shutdown drains whatever is queued

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ApiDefinition;
use crate::health::hosts::HostHealthReport;

pub mod emitter;
pub mod registry;

pub use emitter::EventEmitter;
pub use registry::ApiRegistry;

/// Kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    HostDown,
    HostUp,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::HostDown => "HostDown",
            EventKind::HostUp => "HostUp",
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            EventKind::HostDown => "Uptime test failed",
            EventKind::HostUp => "Uptime test succeeded",
        }
    }
}

/// Event payload for a host status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatusEvent {
    pub kind: EventKind,
    pub api_id: String,
    pub api_name: String,
    pub message: String,
    pub host_info: HostHealthReport,
}

impl HostStatusEvent {
    pub fn new(kind: EventKind, api: &ApiDefinition, report: HostHealthReport) -> Self {
        Self {
            kind,
            api_id: api.api_id.clone(),
            api_name: api.name.clone(),
            message: kind.default_message().to_string(),
            host_info: report,
        }
    }
}

/// Destination for delivered events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn handle(&self, event: HostStatusEvent);
}

/// Writes every event to the log as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn handle(&self, event: HostStatusEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(
                event = event.kind.as_str(),
                api_id = %event.api_id,
                %payload,
                "Event fired"
            ),
            Err(e) => tracing::error!(event = event.kind.as_str(), error = %e, "Failed to encode event"),
        }
    }
}
