//! # Outbound notifications
//!
//! Booking confirmations and cancellations are handed to a bounded queue
//! after the owning transaction commits. A single background worker drains
//! the queue and calls the configured [`Notifier`]. Delivery is best
//! effort: a full queue drops the message and a failing notifier is logged,
//! and neither outcome ever reaches the caller of the booking operation.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::booking::BookingDetails;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    BookingConfirmed(BookingDetails),
    BookingCancelled(BookingDetails),
}

impl Notification {
    pub fn booking_id(&self) -> Uuid {
        self.details().id
    }

    pub fn details(&self) -> &BookingDetails {
        match self {
            Notification::BookingConfirmed(details) | Notification::BookingCancelled(details) => {
                details
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::BookingConfirmed(_) => "booking_confirmed",
            Notification::BookingCancelled(_) => "booking_cancelled",
        }
    }
}

/// The outbound email collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_confirmed(&self, details: &BookingDetails) -> eyre::Result<()>;

    async fn booking_cancelled(&self, details: &BookingDetails) -> eyre::Result<()>;
}

#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    /// Starts the delivery worker. The worker exits once every queue handle
    /// has been dropped and the backlog is drained.
    pub fn spawn(notifier: Arc<dyn Notifier>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(deliver(notifier, receiver));
        (Self { sender }, worker)
    }

    /// Never blocks.
    pub fn enqueue(&self, notification: Notification) {
        if let Err(err) = self.sender.try_send(notification) {
            let (reason, notification) = match err {
                TrySendError::Full(n) => ("queue full", n),
                TrySendError::Closed(n) => ("queue closed", n),
            };
            warn!(
                booking_id = %notification.booking_id(),
                kind = notification.kind(),
                reason,
                "Dropping notification"
            );
        }
    }
}

async fn deliver(notifier: Arc<dyn Notifier>, mut receiver: mpsc::Receiver<Notification>) {
    while let Some(notification) = receiver.recv().await {
        let result = match &notification {
            Notification::BookingConfirmed(details) => notifier.booking_confirmed(details).await,
            Notification::BookingCancelled(details) => notifier.booking_cancelled(details).await,
        };

        match result {
            Ok(()) => debug!(
                booking_id = %notification.booking_id(),
                kind = notification.kind(),
                "Notification delivered"
            ),
            Err(err) => warn!(
                booking_id = %notification.booking_id(),
                kind = notification.kind(),
                error = %err,
                "Notification delivery failed"
            ),
        }
    }
}
