//! Event records and the caller-facing capacity snapshot.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event with fixed ticket capacity.
///
/// `ticket_limit` is immutable for the lifetime of the event. Available and
/// waitlisted counts are derived from booking records, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub ticket_limit: u32,
}

/// Read-only capacity snapshot returned by
/// [`BookingManager::event_status`](crate::BookingManager::event_status).
///
/// Taken outside any lock, so it may be stale by the time it is observed;
/// only the write paths inside the manager are linearized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventStatus {
    pub tickets_available: u64,
    pub waiting_list_count: u64,
}
