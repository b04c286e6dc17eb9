//! PostgreSQL implementation of the Turnstile store contracts.
//!
//! This crate provides the production implementation of the `UserStore`,
//! `EventStore` and `BookingStore` traits from the Turnstile engine.
//!
//! # Features
//!
//! - Conditional status updates (`UPDATE ... WHERE status = expected`) so
//!   the engine can detect rows mutated underneath it
//! - Waitlist head lookup backed by a partial index on PENDING rows
//! - Soft-terminal bookings: cancelled rows are kept, never deleted
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name TEXT NOT NULL
//! );
//!
//! CREATE TABLE events (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name TEXT NOT NULL,
//!     ticket_limit INTEGER NOT NULL CHECK (ticket_limit > 0)
//! );
//!
//! CREATE TABLE bookings (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     event_id UUID NOT NULL REFERENCES events(id),
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     status TEXT NOT NULL CHECK (status IN ('pending', 'confirmed', 'cancelled')),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE INDEX idx_bookings_waitlist ON bookings (event_id, created_at, id)
//!     WHERE status = 'pending';
//! CREATE INDEX idx_bookings_event_status ON bookings (event_id, status);
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use turnstile_postgres::PgStore;
//!
//! let pool = PgPool::connect("postgres://localhost/tickets").await?;
//! let store = Arc::new(PgStore::new(pool));
//! let (manager, worker) = BookingManager::new(store.clone(), store.clone(), store);
//! ```

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use turnstile_core::{
    Booking, BookingStatus, BookingStore, Event, EventStore, NewBooking, User, UserStore,
};

/// PostgreSQL-backed store for users, events and bookings.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn booking_from_row(row: &PgRow) -> Result<Booking> {
    let status: String = row.get("status");
    let status = BookingStatus::parse(&status)
        .ok_or_else(|| anyhow!("unknown booking status in store: {status}"))?;
    let created_at: DateTime<Utc> = row.get("created_at");
    Ok(Booking {
        id: row.get("id"),
        event_id: row.get("event_id"),
        user_id: row.get("user_id"),
        status,
        created_at,
    })
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query("SELECT id, name, ticket_limit FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let limit: i32 = row.get("ticket_limit");
            Ok(Event {
                id: row.get("id"),
                name: row.get("name"),
                ticket_limit: u32::try_from(limit).context("ticket_limit out of range")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl BookingStore for PgStore {
    /// Persist a new booking. The database assigns `id` and `created_at`;
    /// `created_at` comes from the database clock so waitlist order is
    /// consistent across application processes.
    async fn create(&self, booking: NewBooking) -> Result<Booking> {
        let row = sqlx::query(
            r#"
            INSERT INTO bookings (event_id, user_id, status)
            VALUES ($1, $2, $3)
            RETURNING id, event_id, user_id, status, created_at
            "#,
        )
        .bind(booking.event_id)
        .bind(booking.user_id)
        .bind(booking.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        booking_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, event_id, user_id, status, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, event_id, user_id, status, created_at
            FROM bookings
            WHERE user_id = $1
              AND event_id = $2
              AND status <> 'cancelled'
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn find_first_pending(&self, event_id: Uuid) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, event_id, user_id, status, created_at
            FROM bookings
            WHERE event_id = $1
              AND status = 'pending'
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn confirmed_count(&self, event_id: Uuid) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM bookings WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.get("total");
        Ok(total as u64)
    }

    async fn pending_count(&self, event_id: Uuid) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM bookings WHERE event_id = $1 AND status = 'pending'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.get("total");
        Ok(total as u64)
    }

    /// Conditional status move. The `status = expected` predicate is what
    /// lets the engine distinguish a row that vanished or changed from a
    /// clean update: zero rows returned means the precondition no longer
    /// holds.
    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $1
            WHERE id = $2
              AND status = $3
            RETURNING id, event_id, user_id, status, created_at
            "#,
        )
        .bind(next.as_str())
        .bind(id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }
}
