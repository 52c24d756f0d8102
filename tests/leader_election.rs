//! Leader election over the shared store.

use std::sync::Arc;
use std::time::Duration;

use uptime_coordinator::health::hosts::POLLER_CACHE_KEY;
use uptime_coordinator::store::{MemoryStore, StorageHandler};

mod common;
use common::{EngineCall, Harness, RecordingStore};

#[tokio::test]
async fn test_racing_identities_converge_on_one_leader() {
    let store = Arc::new(MemoryStore::new());
    let a = Harness::new(store.clone(), vec![]);
    let b = Harness::new(store.clone(), vec![]);

    let (a_leads, b_leads) = tokio::join!(a.manager.am_i_polling(), b.manager.am_i_polling());
    assert!(a_leads ^ b_leads, "exactly one identity must win");

    let (winner, loser) = if a_leads { (&a, &b) } else { (&b, &a) };
    let holder = store.get_key(POLLER_CACHE_KEY).await.unwrap();
    assert_eq!(holder.as_deref(), Some(winner.manager.id()));

    // The loser keeps losing while the lease is valid.
    assert!(!loser.manager.am_i_polling().await);
    assert!(winner.manager.am_i_polling().await);
    assert_eq!(
        store.get_key(POLLER_CACHE_KEY).await.unwrap().as_deref(),
        Some(winner.manager.id())
    );
}

#[tokio::test]
async fn test_read_failure_claims_leadership_once() {
    let store = Arc::new(RecordingStore::failing_reads());
    let h = Harness::new(store.clone(), vec![]);

    assert!(h.manager.am_i_polling().await);

    let sets = store.sets();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0], (POLLER_CACHE_KEY.to_string(), h.manager.id().to_string(), 15));
}

#[tokio::test]
async fn test_follower_stops_local_engine() {
    let store = Arc::new(MemoryStore::new());
    let a = Harness::new(store.clone(), vec![]);
    let b = Harness::new(store.clone(), vec![]);

    assert!(a.manager.check_active_poller().await);
    assert_eq!(
        store.get_key(POLLER_CACHE_KEY).await.unwrap().as_deref(),
        Some(a.manager.id())
    );

    // B was polling on its own before it saw A's lease.
    b.manager.start_poller().await;
    assert!(b.manager.is_polling());
    assert_eq!(b.engine_calls(), vec![EngineCall::Init { hosts: 0 }, EngineCall::Start]);

    assert!(!b.manager.check_active_poller().await);
    assert!(!b.manager.is_polling());
    assert_eq!(b.engine_calls().last(), Some(&EngineCall::Stop));
    assert_eq!(
        store.get_key(POLLER_CACHE_KEY).await.unwrap().as_deref(),
        Some(a.manager.id())
    );
}

#[tokio::test]
async fn test_follower_without_engine_does_nothing() {
    let store = Arc::new(MemoryStore::new());
    let a = Harness::new(store.clone(), vec![]);
    let b = Harness::new(store.clone(), vec![]);

    assert!(a.manager.check_active_poller().await);
    assert!(!b.manager.check_active_poller().await);
    assert!(b.engine_calls().is_empty());
    assert_eq!(b.engines_created.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_expired_lease_hands_over() {
    let store = Arc::new(MemoryStore::new());
    let a = Harness::new(store.clone(), vec![]);
    let b = Harness::new(store.clone(), vec![]);

    assert!(a.manager.am_i_polling().await);
    assert!(!b.manager.am_i_polling().await);

    // A stops renewing; its lease lapses after 15s.
    tokio::time::advance(Duration::from_secs(16)).await;
    assert!(b.manager.am_i_polling().await);
    assert!(!a.manager.am_i_polling().await);
}

#[tokio::test(start_paused = true)]
async fn test_election_loop_starts_poller_and_stops_cleanly() {
    let store = Arc::new(MemoryStore::new());
    let h = Harness::new(store.clone(), vec![]);

    assert!(h.manager.start());
    // A second start is a no-op.
    assert!(h.manager.start());

    common::wait_until(|| async { h.engine_calls().contains(&EngineCall::Start) }).await;
    assert!(h.manager.is_polling());

    // Several ticks renew the lease without restarting the engine.
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(
        store.get_key(POLLER_CACHE_KEY).await.unwrap().as_deref(),
        Some(h.manager.id())
    );
    assert_eq!(
        h.engine_calls().iter().filter(|c| **c == EngineCall::Start).count(),
        1
    );

    h.manager.stop().await;
    assert!(!h.manager.is_polling());
    assert_eq!(h.engine_calls().last(), Some(&EngineCall::Stop));
    assert!(!h.manager.start());
}
