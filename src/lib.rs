//! Cluster-coordinated uptime checking for an API gateway.
//!
//! One gateway node at a time runs upstream health checks. Down hosts are
//! recorded in a shared store so every node can route around them, and
//! state changes are raised as per-API events.

pub mod config;
pub mod events;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::schema::GatewayConfig;
pub use health::HostCheckerManager;
pub use lifecycle::StopSignal;
