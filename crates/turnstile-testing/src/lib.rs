//! In-memory store implementation and seeding helpers for Turnstile.
//!
//! `MemoryStore` implements all three store contracts behind `DashMap`
//! tables. It is the store used by the core crate's tests and the demo;
//! production deployments use `turnstile-postgres`.
//!
//! Assigned `created_at` timestamps are strictly monotonic, so waitlist
//! order always matches creation order even when the wall clock is coarser
//! than the creation rate.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use turnstile_core::{
    Booking, BookingStatus, BookingStore, Event, EventStore, NewBooking, User, UserStore,
};

/// In-memory users, events and bookings.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    events: DashMap<Uuid, Event>,
    bookings: DashMap<Uuid, Booking>,
    last_created_at: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user and return it.
    pub fn seed_user(&self, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.users.insert(user.id, user.clone());
        user
    }

    /// Insert an event with the given capacity and return it.
    pub fn seed_event(&self, name: &str, ticket_limit: u32) -> Event {
        let event = Event {
            id: Uuid::new_v4(),
            name: name.to_string(),
            ticket_limit,
        };
        self.events.insert(event.id, event.clone());
        event
    }

    /// All bookings for an event in waitlist order, regardless of status.
    pub fn bookings_for_event(&self, event_id: Uuid) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| entry.event_id == event_id)
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by_key(Booking::waitlist_key);
        bookings
    }

    /// Overwrite a booking row directly, bypassing the engine. Exists so
    /// tests can simulate external store mutation.
    pub fn put_booking(&self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }

    /// Remove a booking row directly, bypassing the engine.
    pub fn remove_booking(&self, booking_id: Uuid) {
        self.bookings.remove(&booking_id);
    }

    // Strictly increasing creation timestamps: nudge forward by a
    // microsecond whenever the clock has not advanced since the last assign.
    fn next_created_at(&self) -> DateTime<Utc> {
        let mut last = self.last_created_at.lock().unwrap();
        let mut now = Utc::now();
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }

    fn count_with_status(&self, event_id: Uuid, status: BookingStatus) -> u64 {
        self.bookings
            .iter()
            .filter(|entry| entry.event_id == event_id && entry.status == status)
            .count() as u64
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create(&self, booking: NewBooking) -> Result<Booking> {
        let created = Booking {
            id: Uuid::new_v4(),
            event_id: booking.event_id,
            user_id: booking.user_id,
            status: booking.status,
            created_at: self.next_created_at(),
        };
        self.bookings.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.bookings.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|entry| {
                entry.user_id == user_id
                    && entry.event_id == event_id
                    && entry.status != BookingStatus::Cancelled
            })
            .map(|entry| entry.value().clone())
            .min_by_key(Booking::waitlist_key))
    }

    async fn find_first_pending(&self, event_id: Uuid) -> Result<Option<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|entry| {
                entry.event_id == event_id && entry.status == BookingStatus::Pending
            })
            .map(|entry| entry.value().clone())
            .min_by_key(Booking::waitlist_key))
    }

    async fn confirmed_count(&self, event_id: Uuid) -> Result<u64> {
        Ok(self.count_with_status(event_id, BookingStatus::Confirmed))
    }

    async fn pending_count(&self, event_id: Uuid) -> Result<u64> {
        Ok(self.count_with_status(event_id, BookingStatus::Pending))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Option<Booking>> {
        match self.bookings.get_mut(&id) {
            Some(mut entry) if entry.status == expected => {
                entry.status = next;
                Ok(Some(entry.value().clone()))
            }
            _ => Ok(None),
        }
    }
}
