//! Stop signalling for long-running tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// A one-shot stop flag that can also wake sleeping tasks.
///
/// Loops check `is_stopped()` between iterations and `select!` on a
/// subscription so a stop does not wait out a full tick.
pub struct StopSignal {
    stopped: AtomicBool,
    tx: broadcast::Sender<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            stopped: AtomicBool::new(false),
            tx,
        }
    }

    /// Subscribe to the wake-up. Subscribe before spawning the task that waits.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Set the flag and wake subscribers. Returns false if already stopped.
    pub fn trigger(&self) -> bool {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.tx.send(());
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
