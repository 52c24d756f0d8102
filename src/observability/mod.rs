//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Manager, checker, emitter produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (leadership, transitions, dropped events)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`api_id`, `key`, `instance_id`) over formatted strings
//! - Metrics go through the `metrics` facade; no exporter is installed here

pub mod logging;
pub mod metrics;
