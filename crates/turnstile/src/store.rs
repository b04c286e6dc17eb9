//! Store contracts consumed by the admission engine.
//!
//! The engine is the sole writer of booking status; implementations only
//! need to honor the read/conditional-write contract below. See
//! `turnstile-postgres` for the production implementation and
//! `turnstile-testing` for the in-memory one.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, NewBooking};
use crate::event::Event;
use crate::user::User;

/// User lookup.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Event lookup.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;
}

/// Booking persistence.
///
/// All counts and lookups are snapshot reads; the manager supplies
/// consistency by holding the relevant locks around them.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a new booking, assigning its `id` and `created_at`.
    async fn create(&self, booking: NewBooking) -> Result<Booking>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;

    /// The user's non-cancelled booking for the event, if any. At most one
    /// exists; the manager enforces that before every create.
    async fn find_active_for_user(&self, user_id: Uuid, event_id: Uuid)
        -> Result<Option<Booking>>;

    /// The PENDING booking with the smallest `(created_at, id)` for the
    /// event, or `None` if the waitlist is empty.
    async fn find_first_pending(&self, event_id: Uuid) -> Result<Option<Booking>>;

    /// Number of CONFIRMED bookings for the event.
    async fn confirmed_count(&self, event_id: Uuid) -> Result<u64>;

    /// Number of PENDING bookings for the event.
    async fn pending_count(&self, event_id: Uuid) -> Result<u64>;

    /// Conditionally move a booking from `expected` to `next`.
    ///
    /// Returns the updated booking, or `None` if the row no longer matches
    /// the precondition (absent, or status changed underneath us). The
    /// manager maps `None` to
    /// [`BookingNotFound`](crate::BookingError::BookingNotFound); under its
    /// locking discipline the precondition can only be violated by external
    /// mutation of the store.
    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Option<Booking>>;
}
