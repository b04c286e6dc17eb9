//! Fire-and-forget waitlist promotion.
//!
//! Cancellation must not wait for promotion: the manager pushes the affected
//! event id onto an internal work queue and returns, and a dedicated worker
//! task drains the queue and runs the promotion passes. Modelling the
//! trigger as a queue (rather than a callback chain) keeps promotion from
//! re-entering the manager inside the cancel critical section.
//!
//! Worker errors are logged, never propagated: a failed pass affects no
//! caller-facing response, and the next cancellation for the event schedules
//! a fresh pass.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::warn;
use uuid::Uuid;

use crate::manager::BookingManager;

#[derive(Default)]
struct QueueState {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Sending half of the promotion queue, held by the manager.
#[derive(Clone)]
pub struct PromotionQueue {
    tx: mpsc::UnboundedSender<Uuid>,
    state: Arc<QueueState>,
}

impl PromotionQueue {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Uuid>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            tx,
            state: Arc::new(QueueState::default()),
        };
        (queue, rx)
    }

    /// Schedule a promotion pass for an event. Returns immediately.
    pub(crate) fn schedule(&self, event_id: Uuid) {
        self.state.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(event_id).is_err() {
            self.settle_one();
            warn!(%event_id, "promotion worker not running, waitlist bump dropped");
        }
    }

    /// Wait until every scheduled promotion pass has completed.
    ///
    /// Promotion is decoupled from the cancel response, so observers that
    /// assert on post-cancellation waitlist state call this first.
    pub async fn quiesce(&self) {
        loop {
            // Register interest before checking, or a settle between the
            // check and the await is missed.
            let idle = self.state.idle.notified();
            if self.state.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }

    fn settle_one(&self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.state.idle.notify_waiters();
    }
}

/// Receiving half of the promotion queue: a dedicated task that runs
/// promotion passes off the cancel critical path.
///
/// Spawn it once next to the manager:
///
/// ```ignore
/// let (manager, worker) = BookingManager::new(users, events, bookings);
/// tokio::spawn(worker.run());
/// ```
pub struct PromotionWorker {
    manager: Arc<BookingManager>,
    rx: mpsc::UnboundedReceiver<Uuid>,
    queue: PromotionQueue,
}

impl PromotionWorker {
    pub(crate) fn new(
        manager: Arc<BookingManager>,
        rx: mpsc::UnboundedReceiver<Uuid>,
        queue: PromotionQueue,
    ) -> Self {
        Self { manager, rx, queue }
    }

    /// Drain scheduled promotion passes until the task is dropped.
    pub async fn run(mut self) {
        while let Some(event_id) = self.rx.recv().await {
            if let Err(error) = self.manager.bump_waitlist(event_id).await {
                warn!(%event_id, %error, "waitlist promotion pass failed");
            }
            self.queue.settle_one();
        }
    }
}
