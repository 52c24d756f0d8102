//! Bounded event queue with a single delivery worker.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::events::{EventSink, HostStatusEvent};
use crate::lifecycle::StopSignal;
use crate::observability::metrics;

/// Fire-and-forget event emitter.
///
/// `fire_event` never waits: when the queue is full the event is dropped and
/// counted. `shutdown` stops intake and delivers everything already queued.
pub struct EventEmitter {
    tx: mpsc::Sender<HostStatusEvent>,
    stop: Arc<StopSignal>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventEmitter {
    /// Spawn the delivery worker. Must be called within a tokio runtime.
    pub fn spawn(sink: Arc<dyn EventSink>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stop = Arc::new(StopSignal::new());
        let worker = tokio::spawn(deliver(rx, sink, stop.subscribe()));

        Self {
            tx,
            stop,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue an event. Returns false if it was dropped.
    pub fn fire_event(&self, event: HostStatusEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    event = event.kind.as_str(),
                    api_id = %event.api_id,
                    capacity = self.tx.max_capacity(),
                    "Event queue full, dropping event"
                );
                metrics::record_event_dropped();
                false
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(
                    event = event.kind.as_str(),
                    api_id = %event.api_id,
                    "Event emitter shut down, dropping event"
                );
                metrics::record_event_dropped();
                false
            }
        }
    }

    /// Number of events waiting for delivery.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Stop accepting events and wait for queued ones to be delivered.
    pub async fn shutdown(&self) {
        self.stop.trigger();
        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Event worker terminated abnormally");
            }
        }
    }
}

async fn deliver(
    mut rx: mpsc::Receiver<HostStatusEvent>,
    sink: Arc<dyn EventSink>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            event = rx.recv() => match event {
                Some(event) => sink.handle(event).await,
                None => return,
            },
        }
    }

    rx.close();
    let mut drained = 0usize;
    while let Some(event) = rx.recv().await {
        sink.handle(event).await;
        drained += 1;
    }
    tracing::debug!(drained, "Event worker drained queue");
}
