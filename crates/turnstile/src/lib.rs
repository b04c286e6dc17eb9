//! # Turnstile
//!
//! An admission and waitlist-promotion engine: each event has a fixed ticket
//! capacity, booking requests either consume a seat (CONFIRMED) or join a
//! first-in-first-out waitlist (PENDING), and cancellations free capacity and
//! promote the earliest waitlisted booking.
//!
//! ## Core Concepts
//!
//! Turnstile separates **deciding** from **serializing**:
//! - [`Booking`] transitions = pure guards (what moves are legal)
//! - [`LockRegistry`] = per-entity critical sections (who moves when)
//!
//! The key principle: **all capacity-affecting reads and writes for one event
//! happen under that event's lock**. That single discipline is what makes
//! "never more confirmed bookings than capacity" hold under concurrency.
//!
//! ## Architecture
//!
//! ```text
//! Edge (HTTP, excluded from this crate)
//!     │
//!     ▼ create_booking / cancel_booking / event_status
//! BookingManager
//!     │
//!     ├─► LockRegistry ── one tokio::sync::Mutex per event id
//!     │                   one per booking id, lazily created
//!     │
//!     ├─► CapacityView ── sold-out? / tickets available / first PENDING
//!     │
//!     ├─► BookingStore ── create / conditional status update
//!     │
//!     └─► PromotionQueue ── schedule(event_id) ──┐
//!                                                │ mpsc
//!                                                ▼
//!                                       PromotionWorker.run() loop
//!                                                │
//!                                                └─► bump_waitlist()
//! ```
//!
//! ## Key Invariants
//!
//! 1. **No oversell** - confirmed bookings for an event never exceed its
//!    ticket limit, at any observation point
//! 2. **FIFO promotion** - the earliest `(created_at, id)` PENDING booking is
//!    promoted first
//! 3. **CANCELLED is terminal** - no transition leaves it; bookings are never
//!    deleted
//! 4. **One active booking per user per event** - enforced by the manager
//!    before creation, not by the state machine
//! 5. **Scoped acquisition** - locks release on every exit path, including
//!    errors; guards are dropped, never forgotten
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use turnstile_core::BookingManager;
//!
//! let (manager, worker) = BookingManager::new(users, events, bookings);
//! tokio::spawn(worker.run());
//!
//! let ticket = manager.create_booking(user_id, event_id).await?;
//! let cancelled = manager.cancel_booking(ticket.id).await?;
//!
//! // Promotion is fire-and-forget; wait for it to settle before asserting.
//! manager.quiesce().await;
//! ```
//!
//! ## What This Is Not
//!
//! Turnstile is **not**:
//! - An HTTP layer (routing, validation and auth live in the caller)
//! - A persistence engine (stores are trait contracts; see
//!   `turnstile-postgres` and `turnstile-testing`)
//! - A distributed coordinator (the lock table is single-process, in-memory)
//! - A payment or scheduling system
//!
//! Turnstile **is**:
//! > The booking state machine, the per-event/per-booking mutual-exclusion
//! > discipline, and the FIFO promotion algorithm.

// Core modules
mod booking;
mod capacity;
mod error;
mod event;
mod locks;
mod manager;
mod promote;
mod store;
mod user;

// Manager behavior tests (test-only)
#[cfg(test)]
mod manager_tests;


// Re-export domain types
pub use booking::{Booking, BookingStatus, NewBooking};
pub use event::{Event, EventStatus};
pub use user::User;

// Re-export error types
pub use error::{BookingError, ErrorCategory};

// Re-export capacity queries
pub use capacity::CapacityView;

// Re-export lock registry
pub use locks::LockRegistry;

// Re-export store contracts
pub use store::{BookingStore, EventStore, UserStore};

// Re-export manager and promotion types (primary entry point)
pub use manager::BookingManager;
pub use promote::{PromotionQueue, PromotionWorker};

// Re-export commonly used external types
pub use async_trait::async_trait;
