//! The booking state machine.
//!
//! Pure transition logic, no locking and no IO. The manager decides *when* a
//! transition may run (under which locks); this module decides *whether* it
//! is legal at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BookingError;

/// Status of a booking.
///
/// `Cancelled` is terminal: no transition leaves it. There is no
/// `Confirmed -> Pending` downgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// On the waitlist, ordered by `(created_at, id)`.
    Pending,
    /// Holds a seat and counts against the event's ticket limit.
    Confirmed,
    /// Terminal. Cancelled bookings are kept, never deleted.
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A booking for one event by one user.
///
/// Ownership is by lookup, not containment: events and users hold no
/// collection of their bookings. `created_at` is strictly the FIFO promotion
/// key; ties break by ascending `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Guard for the cancel transition.
    ///
    /// Legal from `Pending` or `Confirmed`; a booking can only be cancelled
    /// once.
    pub fn cancel(&self) -> Result<BookingStatus, BookingError> {
        match self.status {
            BookingStatus::Cancelled => Err(BookingError::BookingAlreadyCancelled(self.id)),
            BookingStatus::Pending | BookingStatus::Confirmed => Ok(BookingStatus::Cancelled),
        }
    }

    /// Guard for the waitlist promotion transition.
    ///
    /// Legal only from `Pending`.
    pub fn upgrade(&self) -> Result<BookingStatus, BookingError> {
        match self.status {
            BookingStatus::Confirmed => Err(BookingError::BookingAlreadyConfirmed(self.id)),
            BookingStatus::Cancelled => Err(BookingError::BookingAlreadyCancelled(self.id)),
            BookingStatus::Pending => Ok(BookingStatus::Confirmed),
        }
    }

    /// FIFO ordering key for waitlist promotion.
    pub fn waitlist_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

/// A booking about to be created. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Copy)]
pub struct NewBooking {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: BookingStatus,
}

impl NewBooking {
    /// A confirmed seat (capacity was available).
    pub fn confirmed(event_id: Uuid, user_id: Uuid) -> Self {
        Self {
            event_id,
            user_id,
            status: BookingStatus::Confirmed,
        }
    }

    /// A waitlist entry (capacity was exhausted).
    pub fn pending(event_id: Uuid, user_id: Uuid) -> Self {
        Self {
            event_id,
            user_id,
            status: BookingStatus::Pending,
        }
    }
}
