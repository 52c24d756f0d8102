//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (owned by the gateway process):
//!     Load config → ApiRegistry → EventEmitter → HostCheckerManager::new
//!     → set_checker_host_list → start
//!
//! Reload (reload.rs):
//!     ConfigWatcher update → swap ApiRegistry → set_checker_host_list
//!
//! Shutdown (shutdown.rs):
//!     StopSignal → election loop exits → poller stopped → events drained
//! ```
//!
//! # Design Decisions
//! - No globals: the manager is an explicit value cloned into consumers
//! - Shutdown is ordered: stop electing, stop polling, then drain events

pub mod reload;
pub mod shutdown;

pub use reload::{apply_reload, run_reload_loop};
pub use shutdown::StopSignal;
