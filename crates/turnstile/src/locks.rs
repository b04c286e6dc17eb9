//! Per-entity lock registry.
//!
//! Two independent keyspaces, one exclusive lock per event id and one per
//! booking id, created lazily on first use and retained for the process
//! lifetime. Unbounded growth of the table is a deliberate simplification;
//! a reference-counted eviction pass would be the production hardening step.
//!
//! Acquisition never fails, it only suspends. `tokio::sync::Mutex` queues
//! waiters in FIFO order, so no caller is starved on a contended key. Guards
//! are owned, so release happens on drop on every exit path.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Lazily-populated table of per-event and per-booking mutexes.
#[derive(Default)]
pub struct LockRegistry {
    events: DashMap<Uuid, Arc<Mutex<()>>>,
    bookings: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive lock for an event id.
    pub async fn lock_event(&self, event_id: Uuid) -> OwnedMutexGuard<()> {
        Self::handle(&self.events, event_id).lock_owned().await
    }

    /// Acquire the exclusive lock for a booking id.
    pub async fn lock_booking(&self, booking_id: Uuid) -> OwnedMutexGuard<()> {
        Self::handle(&self.bookings, booking_id).lock_owned().await
    }

    // Clone the Arc out before awaiting: a dashmap shard guard must never be
    // held across a suspension point.
    fn handle(table: &DashMap<Uuid, Arc<Mutex<()>>>, key: Uuid) -> Arc<Mutex<()>> {
        table
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
