//! Error types for the admission engine.
//!
//! Every error is a terminal outcome of one logical operation: nothing here
//! is retried automatically, and nothing is logged-and-swallowed on a
//! caller-facing path. Each variant carries the identity of the entity it is
//! about so callers can report it with full context.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification for mapping domain errors to a transport layer
/// without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The referenced entity does not exist (4xx not-found class).
    NotFound,
    /// An invariant-preserving rejection of an invalid request (4xx conflict
    /// class).
    Conflict,
    /// Storage or infrastructure failure (5xx class).
    Internal,
}

/// Errors produced by booking admission, cancellation and promotion.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("event {0} not found")]
    EventNotFound(Uuid),

    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("user {user_id} already has a booking for event {event_id}")]
    UserAlreadyHasBooking { user_id: Uuid, event_id: Uuid },

    #[error("user {user_id} is already on the waitlist for event {event_id}")]
    UserAlreadyOnWaitList { user_id: Uuid, event_id: Uuid },

    #[error("booking {0} has already been cancelled")]
    BookingAlreadyCancelled(Uuid),

    #[error("booking {0} has already been confirmed")]
    BookingAlreadyConfirmed(Uuid),

    /// Guard inside the confirmed-ticket creation primitive. The manager
    /// checks sold-out status under the event lock before issuing, so this
    /// never escapes `create_booking`; sold-out requests join the waitlist
    /// instead.
    #[error("event {0} is sold out")]
    EventSoldOut(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl BookingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UserNotFound(_) | Self::EventNotFound(_) | Self::BookingNotFound(_) => {
                ErrorCategory::NotFound
            }
            Self::UserAlreadyHasBooking { .. }
            | Self::UserAlreadyOnWaitList { .. }
            | Self::BookingAlreadyCancelled(_)
            | Self::BookingAlreadyConfirmed(_)
            | Self::EventSoldOut(_) => ErrorCategory::Conflict,
            Self::Store(_) => ErrorCategory::Internal,
        }
    }
}
