//! Behavior tests for the admission controller: admission decisions,
//! cancellation semantics, and FIFO waitlist promotion.

use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{Booking, BookingError, BookingManager, BookingStatus, BookingStore};
use turnstile_testing::MemoryStore;

struct Harness {
    store: Arc<MemoryStore>,
    manager: Arc<BookingManager>,
    _worker: JoinHandle<()>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let (manager, worker) =
        BookingManager::new(store.clone(), store.clone(), store.clone());
    let worker = tokio::spawn(worker.run());
    Harness {
        store,
        manager,
        _worker: worker,
    }
}

impl Harness {
    /// Book one seat per fresh user, returning the bookings in order.
    async fn book_fresh_users(&self, event_id: Uuid, count: usize) -> Vec<Booking> {
        let mut bookings = Vec::with_capacity(count);
        for i in 0..count {
            let user = self.store.seed_user(&format!("user-{i}"));
            bookings.push(
                self.manager
                    .create_booking(user.id, event_id)
                    .await
                    .unwrap(),
            );
        }
        bookings
    }

    async fn confirmed_count(&self, event_id: Uuid) -> u64 {
        self.store.confirmed_count(event_id).await.unwrap()
    }

    async fn pending_count(&self, event_id: Uuid) -> u64 {
        self.store.pending_count(event_id).await.unwrap()
    }
}

#[tokio::test]
async fn confirms_while_capacity_remains() {
    let h = harness();
    let event = h.store.seed_event("Opening night", 3);

    let bookings = h.book_fresh_users(event.id, 3).await;
    assert!(bookings
        .iter()
        .all(|b| b.status == BookingStatus::Confirmed));

    let status = h.manager.event_status(event.id).await.unwrap();
    assert_eq!(status.tickets_available, 0);
    assert_eq!(status.waiting_list_count, 0);
}

#[tokio::test]
async fn sold_out_event_waitlists_new_users() {
    // Scenario D: limit 3, 3 confirmed, a fourth user joins the waitlist.
    let h = harness();
    let event = h.store.seed_event("Matinee", 3);
    h.book_fresh_users(event.id, 3).await;

    let late = h.store.seed_user("late-arrival");
    let booking = h.manager.create_booking(late.id, event.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    let status = h.manager.event_status(event.id).await.unwrap();
    assert_eq!(status.tickets_available, 0);
    assert_eq!(status.waiting_list_count, 1);
}

#[tokio::test]
async fn unknown_user_and_event_are_rejected() {
    let h = harness();
    let event = h.store.seed_event("Gala", 5);
    let user = h.store.seed_user("ada");

    let ghost = Uuid::new_v4();
    assert!(matches!(
        h.manager.create_booking(ghost, event.id).await,
        Err(BookingError::UserNotFound(id)) if id == ghost
    ));
    assert!(matches!(
        h.manager.create_booking(user.id, ghost).await,
        Err(BookingError::EventNotFound(id)) if id == ghost
    ));
}

#[tokio::test]
async fn one_active_booking_per_user_per_event() {
    let h = harness();
    let event = h.store.seed_event("Residency", 1);
    let holder = h.store.seed_user("holder");
    let waiter = h.store.seed_user("waiter");

    h.manager.create_booking(holder.id, event.id).await.unwrap();
    assert!(matches!(
        h.manager.create_booking(holder.id, event.id).await,
        Err(BookingError::UserAlreadyHasBooking { user_id, .. }) if user_id == holder.id
    ));

    let waitlisted = h.manager.create_booking(waiter.id, event.id).await.unwrap();
    assert_eq!(waitlisted.status, BookingStatus::Pending);
    assert!(matches!(
        h.manager.create_booking(waiter.id, event.id).await,
        Err(BookingError::UserAlreadyOnWaitList { user_id, .. }) if user_id == waiter.id
    ));
}

#[tokio::test]
async fn cancelled_booking_frees_the_user_to_rebook() {
    let h = harness();
    let event = h.store.seed_event("Revival", 2);
    let user = h.store.seed_user("returning");

    let first = h.manager.create_booking(user.id, event.id).await.unwrap();
    h.manager.cancel_booking(first.id).await.unwrap();
    h.manager.quiesce().await;

    let second = h.manager.create_booking(user.id, event.id).await.unwrap();
    assert_eq!(second.status, BookingStatus::Confirmed);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn cancelling_unknown_booking_mutates_nothing() {
    // Scenario E.
    let h = harness();
    let event = h.store.seed_event("Preview", 2);
    h.book_fresh_users(event.id, 2).await;

    let ghost = Uuid::new_v4();
    assert!(matches!(
        h.manager.cancel_booking(ghost).await,
        Err(BookingError::BookingNotFound(id)) if id == ghost
    ));
    assert_eq!(h.confirmed_count(event.id).await, 2);
}

#[tokio::test]
async fn double_cancel_always_fails() {
    let h = harness();
    let event = h.store.seed_event("One-off", 1);
    let booking = h.book_fresh_users(event.id, 1).await.remove(0);

    let cancelled = h.manager.cancel_booking(booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    assert!(matches!(
        h.manager.cancel_booking(booking.id).await,
        Err(BookingError::BookingAlreadyCancelled(id)) if id == booking.id
    ));
}

#[tokio::test]
async fn externally_deleted_row_reports_not_found() {
    let h = harness();
    let event = h.store.seed_event("Phantom", 1);
    let booking = h.book_fresh_users(event.id, 1).await.remove(0);

    h.store.remove_booking(booking.id);
    assert!(matches!(
        h.manager.cancel_booking(booking.id).await,
        Err(BookingError::BookingNotFound(id)) if id == booking.id
    ));
}

#[tokio::test]
async fn cancel_of_confirmed_seat_promotes_first_waitlisted() {
    // Scenario A: limit 10, 10 confirmed, 1 pending; cancel one confirmed.
    let h = harness();
    let event = h.store.seed_event("Headliner", 10);
    let confirmed = h.book_fresh_users(event.id, 10).await;

    let waiter = h.store.seed_user("waiter");
    let pending = h.manager.create_booking(waiter.id, event.id).await.unwrap();
    assert_eq!(pending.status, BookingStatus::Pending);

    let cancelled = h.manager.cancel_booking(confirmed[3].id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    h.manager.quiesce().await;

    let promoted = h.manager.booking(pending.id).await.unwrap();
    assert_eq!(promoted.status, BookingStatus::Confirmed);
    assert_eq!(h.confirmed_count(event.id).await, 10);
    assert_eq!(h.pending_count(event.id).await, 0);
}

#[tokio::test]
async fn burst_of_cancellations_promotes_whole_waitlist_in_order() {
    // Scenario B: 10 confirmed, 5 pending, cancel 5 confirmed.
    let h = harness();
    let event = h.store.seed_event("Festival", 10);
    let confirmed = h.book_fresh_users(event.id, 10).await;
    let waitlist = h.book_fresh_users(event.id, 5).await;
    assert!(waitlist.iter().all(|b| b.status == BookingStatus::Pending));

    for booking in confirmed.iter().take(5) {
        h.manager.cancel_booking(booking.id).await.unwrap();
    }
    h.manager.quiesce().await;

    for booking in &waitlist {
        let now = h.manager.booking(booking.id).await.unwrap();
        assert_eq!(now.status, BookingStatus::Confirmed);
    }
    assert_eq!(h.confirmed_count(event.id).await, 10);
    assert_eq!(h.pending_count(event.id).await, 0);
}

#[tokio::test]
async fn promotion_stops_exactly_at_capacity() {
    // Scenario C: 10 confirmed, 10 pending, cancel 5; only the first 5
    // waitlisted are promoted.
    let h = harness();
    let event = h.store.seed_event("Arena", 10);
    let confirmed = h.book_fresh_users(event.id, 10).await;
    let waitlist = h.book_fresh_users(event.id, 10).await;

    for booking in confirmed.iter().take(5) {
        h.manager.cancel_booking(booking.id).await.unwrap();
    }
    h.manager.quiesce().await;

    for (i, booking) in waitlist.iter().enumerate() {
        let now = h.manager.booking(booking.id).await.unwrap();
        let expected = if i < 5 {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };
        assert_eq!(now.status, expected, "waitlist position {i}");
    }
    assert_eq!(h.confirmed_count(event.id).await, 10);
    assert_eq!(h.pending_count(event.id).await, 5);
}

#[tokio::test]
async fn single_freed_seat_goes_to_the_earliest_waiter() {
    let h = harness();
    let event = h.store.seed_event("Club show", 1);
    let holder = h.book_fresh_users(event.id, 1).await.remove(0);
    let waitlist = h.book_fresh_users(event.id, 2).await;

    h.manager.cancel_booking(holder.id).await.unwrap();
    h.manager.quiesce().await;

    let first = h.manager.booking(waitlist[0].id).await.unwrap();
    let second = h.manager.booking(waitlist[1].id).await.unwrap();
    assert_eq!(first.status, BookingStatus::Confirmed);
    assert_eq!(second.status, BookingStatus::Pending);
}

#[tokio::test]
async fn cancelling_a_waitlist_entry_promotes_nobody() {
    let h = harness();
    let event = h.store.seed_event("Cellar", 1);
    h.book_fresh_users(event.id, 1).await;
    let waitlist = h.book_fresh_users(event.id, 2).await;

    h.manager.cancel_booking(waitlist[0].id).await.unwrap();
    h.manager.quiesce().await;

    // No seat was freed: the remaining entry stays pending.
    let rest = h.manager.booking(waitlist[1].id).await.unwrap();
    assert_eq!(rest.status, BookingStatus::Pending);
    assert_eq!(h.confirmed_count(event.id).await, 1);
    assert_eq!(h.pending_count(event.id).await, 1);
}

#[tokio::test]
async fn event_status_tracks_bookings_and_waitlist() {
    let h = harness();
    let event = h.store.seed_event("Ballroom", 4);
    h.book_fresh_users(event.id, 2).await;

    let status = h.manager.event_status(event.id).await.unwrap();
    assert_eq!(status.tickets_available, 2);
    assert_eq!(status.waiting_list_count, 0);

    h.book_fresh_users(event.id, 3).await;
    let status = h.manager.event_status(event.id).await.unwrap();
    assert_eq!(status.tickets_available, 0);
    assert_eq!(status.waiting_list_count, 1);

    let ghost = Uuid::new_v4();
    assert!(matches!(
        h.manager.event_status(ghost).await,
        Err(BookingError::EventNotFound(id)) if id == ghost
    ));
}

#[tokio::test]
async fn conservation_across_cancellation_and_promotion() {
    let h = harness();
    let event = h.store.seed_event("Ledger", 3);
    let confirmed = h.book_fresh_users(event.id, 3).await;
    h.book_fresh_users(event.id, 2).await;

    let before = h.confirmed_count(event.id).await + h.pending_count(event.id).await;
    h.manager.cancel_booking(confirmed[0].id).await.unwrap();
    h.manager.quiesce().await;
    let after = h.confirmed_count(event.id).await + h.pending_count(event.id).await;

    // One cancellation, one promotion: the active population shrinks by
    // exactly one.
    assert_eq!(before - 1, after);
    assert_eq!(h.confirmed_count(event.id).await, 3);
}
