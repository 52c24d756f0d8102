//! Uptime checking subsystem.
//!
//! # Data Flow
//! ```text
//! ApiDefinition check lists
//!     → hosts.rs (HostData with api_id / host_name metadata)
//!     → manager.rs (tracked list, handed to the engine while leader)
//!     → engine.rs contract → active.rs scan loop (state.rs per host)
//!     → manager.rs transitions
//!         → store: PollerCheckerInstance:<host> set / deleted
//!         → events: HostDown / HostUp
//! ```
//!
//! # Design Decisions
//! - One active poller per cluster, elected through a lease in the shared store
//! - The engine outlives leadership changes so its host list survives gaps
//! - Down-state lives in the store, so every node can answer `is_host_down`

pub mod active;
pub mod engine;
pub mod hosts;
pub mod manager;
pub mod state;

pub use active::{HostProbe, ProbeOutcome, UptimeChecker};
pub use engine::{CheckerEngine, CheckerSettings, EngineFactory, HostStatusHandler};
pub use hosts::{build_host_list, prepare_tracking_host, HostData, HostHealthReport, HostList};
pub use manager::HostCheckerManager;
