//! # Booking Demo
//!
//! End-to-end walk through the admission engine against the in-memory
//! store: sell out an event, stack a waitlist, cancel seats and watch FIFO
//! promotion settle.

use std::sync::Arc;

use anyhow::Result;
use turnstile_core::{BookingManager, BookingStatus};
use turnstile_testing::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let (manager, worker) = BookingManager::new(store.clone(), store.clone(), store.clone());
    tokio::spawn(worker.run());

    // ========================================================================
    // Sell out a 3-seat event
    // ========================================================================

    let event = store.seed_event("Basement show", 3);
    println!("Event: {} ({} seats)", event.name, event.ticket_limit);

    let mut seats = Vec::new();
    for name in ["ada", "grace", "edsger"] {
        let user = store.seed_user(name);
        let booking = manager.create_booking(user.id, event.id).await?;
        println!("  {name} -> {:?}", booking.status);
        seats.push(booking);
    }

    // ========================================================================
    // Late arrivals join the waitlist in order
    // ========================================================================

    let mut waitlist = Vec::new();
    for name in ["barbara", "donald"] {
        let user = store.seed_user(name);
        let booking = manager.create_booking(user.id, event.id).await?;
        println!("  {name} -> {:?}", booking.status);
        waitlist.push(booking);
    }

    let status = manager.event_status(event.id).await?;
    println!(
        "Status: {} available, {} waiting",
        status.tickets_available, status.waiting_list_count
    );

    // ========================================================================
    // Cancel two seats; promotion runs off the cancel path
    // ========================================================================

    for booking in seats.iter().take(2) {
        manager.cancel_booking(booking.id).await?;
    }
    manager.quiesce().await;

    for (name, booking) in ["barbara", "donald"].iter().zip(&waitlist) {
        let now = manager.booking(booking.id).await?;
        println!("  {name} is now {:?}", now.status);
        assert_eq!(now.status, BookingStatus::Confirmed);
    }

    let status = manager.event_status(event.id).await?;
    println!(
        "Status: {} available, {} waiting",
        status.tickets_available, status.waiting_list_count
    );

    Ok(())
}
