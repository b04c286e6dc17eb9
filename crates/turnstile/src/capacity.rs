//! Read-only capacity queries for one event.
//!
//! These are snapshot reads over the booking store. The manager is
//! responsible for consistency (it evaluates them under the event lock on
//! write paths); this component never locks anything itself.

use anyhow::Result;
use uuid::Uuid;

use crate::booking::Booking;
use crate::event::Event;
use crate::store::BookingStore;

/// Capacity view over a booking store.
pub struct CapacityView<'a> {
    bookings: &'a dyn BookingStore,
}

impl<'a> CapacityView<'a> {
    pub fn new(bookings: &'a dyn BookingStore) -> Self {
        Self { bookings }
    }

    /// True iff the confirmed count has reached the ticket limit.
    pub async fn is_sold_out(&self, event: &Event) -> Result<bool> {
        let confirmed = self.bookings.confirmed_count(event.id).await?;
        Ok(confirmed >= u64::from(event.ticket_limit))
    }

    /// Seats still available. The manager's no-oversell invariant keeps the
    /// confirmed count at or below the limit, so the saturation here is a
    /// backstop, not an expected path.
    pub async fn tickets_available(&self, event: &Event) -> Result<u64> {
        let confirmed = self.bookings.confirmed_count(event.id).await?;
        Ok(u64::from(event.ticket_limit).saturating_sub(confirmed))
    }

    /// Number of bookings waiting for a seat.
    pub async fn waiting_list_count(&self, event_id: Uuid) -> Result<u64> {
        self.bookings.pending_count(event_id).await
    }

    /// The next booking in line for promotion, by `(created_at, id)`.
    pub async fn first_on_waitlist(&self, event_id: Uuid) -> Result<Option<Booking>> {
        self.bookings.find_first_pending(event_id).await
    }
}
