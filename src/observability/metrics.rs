//! Metrics collection.
//!
//! # Metrics
//! - `uptime_leader` (gauge): 1 while this node holds the poller lease
//! - `uptime_host_transitions_total` (counter): down/up transitions by kind
//! - `uptime_events_dropped_total` (counter): events lost to a full or closed queue
//! - `uptime_tracked_hosts` (gauge): hosts handed to the checker
//!
//! Recorded through the `metrics` facade; the embedding process installs the exporter.

use metrics::{counter, gauge};

use crate::events::EventKind;

pub fn record_leadership(is_leader: bool) {
    gauge!("uptime_leader").set(if is_leader { 1.0 } else { 0.0 });
}

pub fn record_host_transition(kind: EventKind) {
    counter!("uptime_host_transitions_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_event_dropped() {
    counter!("uptime_events_dropped_total").increment(1);
}

pub fn record_tracked_hosts(count: usize) {
    gauge!("uptime_tracked_hosts").set(count as f64);
}
