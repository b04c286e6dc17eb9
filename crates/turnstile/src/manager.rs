//! The admission controller.
//!
//! `BookingManager` is the only component with cross-entity invariants and
//! the sole writer of booking status. All capacity-affecting reads and
//! writes for one event run under that event's lock, which totally orders
//! create/cancel/promote per event; operations on different events
//! interleave freely.
//!
//! Lock ordering: `cancel_booking` acquires booking -> event, the promotion
//! pass acquires event -> booking of the *next waitlisted* booking. The two
//! orders touch the same booking only if that booking is simultaneously
//! first-in-line and being cancelled; any new acquisition order added here
//! must be re-audited for cycles.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, NewBooking};
use crate::capacity::CapacityView;
use crate::error::BookingError;
use crate::event::{Event, EventStatus};
use crate::locks::LockRegistry;
use crate::promote::{PromotionQueue, PromotionWorker};
use crate::store::{BookingStore, EventStore, UserStore};
use crate::user::User;

/// Orchestrates booking admission, cancellation and waitlist promotion.
pub struct BookingManager {
    users: Arc<dyn UserStore>,
    events: Arc<dyn EventStore>,
    bookings: Arc<dyn BookingStore>,
    locks: LockRegistry,
    promotions: PromotionQueue,
}

impl BookingManager {
    /// Build a manager and its promotion worker. The worker must be spawned
    /// (`tokio::spawn(worker.run())`) for cancellations to trigger waitlist
    /// promotion.
    pub fn new(
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
        bookings: Arc<dyn BookingStore>,
    ) -> (Arc<Self>, PromotionWorker) {
        let (promotions, rx) = PromotionQueue::channel();
        let manager = Arc::new(Self {
            users,
            events,
            bookings,
            locks: LockRegistry::new(),
            promotions: promotions.clone(),
        });
        let worker = PromotionWorker::new(Arc::clone(&manager), rx, promotions);
        (manager, worker)
    }

    /// Book a seat for `user_id` at `event_id`.
    ///
    /// Returns a CONFIRMED booking while capacity remains, a PENDING
    /// waitlist entry once the event is sold out. Rejects users that already
    /// hold a seat or a waitlist slot for the event.
    ///
    /// The whole decision runs under the event lock: two concurrent calls
    /// for one event are strictly serialized, so both can never observe the
    /// same last free seat.
    pub async fn create_booking(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Booking, BookingError> {
        let _event_guard = self.locks.lock_event(event_id).await;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(BookingError::UserNotFound(user_id))?;
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;

        if let Some(existing) = self
            .bookings
            .find_active_for_user(user.id, event.id)
            .await?
        {
            return Err(match existing.status {
                BookingStatus::Confirmed => BookingError::UserAlreadyHasBooking {
                    user_id: user.id,
                    event_id: event.id,
                },
                _ => BookingError::UserAlreadyOnWaitList {
                    user_id: user.id,
                    event_id: event.id,
                },
            });
        }

        let capacity = CapacityView::new(self.bookings.as_ref());
        if capacity.is_sold_out(&event).await? {
            let booking = self
                .bookings
                .create(NewBooking::pending(event.id, user.id))
                .await?;
            debug!(booking = %booking.id, event = %event.id, user = %user.id,
                "event sold out, joined waitlist");
            return Ok(booking);
        }

        self.issue_ticket(&event, &user, &capacity).await
    }

    // Creation primitive for a confirmed seat. The sold-out guard repeats
    // the caller's check: under the event lock it cannot trip, but issuing a
    // seat past the limit is the one invariant this module must never trade
    // away.
    async fn issue_ticket(
        &self,
        event: &Event,
        user: &User,
        capacity: &CapacityView<'_>,
    ) -> Result<Booking, BookingError> {
        if capacity.is_sold_out(event).await? {
            return Err(BookingError::EventSoldOut(event.id));
        }

        let booking = self
            .bookings
            .create(NewBooking::confirmed(event.id, user.id))
            .await?;
        debug!(booking = %booking.id, event = %event.id, user = %user.id, "seat confirmed");
        Ok(booking)
    }

    /// Cancel a booking.
    ///
    /// The booking lock serializes concurrent cancel/upgrade attempts on the
    /// same booking; the event lock covers the capacity change. If the
    /// cancelled booking held a confirmed seat, a promotion pass for its
    /// event is scheduled asynchronously - the response does not wait for
    /// promotion to complete. Cancelling a PENDING entry frees no seat and
    /// schedules nothing.
    pub async fn cancel_booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let booking_guard = self.locks.lock_booking(booking_id).await;

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        let event_guard = self.locks.lock_event(booking.event_id).await;

        let next = booking.cancel()?;
        let cancelled = self
            .bookings
            .update_status(booking.id, booking.status, next)
            .await?
            // Row vanished or changed between read and conditional write:
            // only reachable if the store was mutated externally.
            .ok_or(BookingError::BookingNotFound(booking.id))?;

        debug!(booking = %cancelled.id, event = %cancelled.event_id,
            was = booking.status.as_str(), "booking cancelled");

        drop(event_guard);
        drop(booking_guard);

        if booking.status == BookingStatus::Confirmed {
            self.promotions.schedule(cancelled.event_id);
        }

        Ok(cancelled)
    }

    /// Capacity snapshot for an event: seats still available and waitlist
    /// length.
    pub async fn event_status(&self, event_id: Uuid) -> Result<EventStatus, BookingError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;

        let capacity = CapacityView::new(self.bookings.as_ref());
        Ok(EventStatus {
            tickets_available: capacity.tickets_available(&event).await?,
            waiting_list_count: capacity.waiting_list_count(event.id).await?,
        })
    }

    /// Look up a booking by id.
    pub async fn booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    /// Wait for all scheduled promotion passes to settle.
    pub async fn quiesce(&self) {
        self.promotions.quiesce().await;
    }

    /// One full promotion sweep for an event, invoked by the promotion
    /// worker.
    ///
    /// Explicit loop, fresh lock acquisition per iteration: check sold-out,
    /// find the earliest PENDING booking, upgrade it under its booking lock,
    /// release everything, repeat. Stops when the event is full or the
    /// waitlist is empty, so a burst of cancellations - each scheduling its
    /// own pass - cannot overshoot capacity; later passes find the event
    /// full and no-op.
    pub(crate) async fn bump_waitlist(&self, event_id: Uuid) -> Result<(), BookingError> {
        loop {
            let event_guard = self.locks.lock_event(event_id).await;

            let event = self
                .events
                .find_by_id(event_id)
                .await?
                .ok_or(BookingError::EventNotFound(event_id))?;

            let capacity = CapacityView::new(self.bookings.as_ref());
            if capacity.is_sold_out(&event).await? {
                return Ok(());
            }

            let Some(next) = capacity.first_on_waitlist(event.id).await? else {
                return Ok(());
            };

            let booking_guard = self.locks.lock_booking(next.id).await;
            let upgraded = next.upgrade()?;
            self.bookings
                .update_status(next.id, next.status, upgraded)
                .await?
                .ok_or(BookingError::BookingNotFound(next.id))?;
            drop(booking_guard);

            debug!(booking = %next.id, event = %event.id, "promoted from waitlist");

            drop(event_guard);
        }
    }
}
