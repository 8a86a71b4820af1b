use async_trait::async_trait;
use mockall::mock;
use slotbook_core::{
    models::booking::BookingDetails,
    notify::{Notification, Notifier},
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

mock! {
    pub Notifier {}

    #[async_trait]
    impl slotbook_core::notify::Notifier for Notifier {
        async fn booking_confirmed(&self, details: &BookingDetails) -> eyre::Result<()>;

        async fn booking_cancelled(&self, details: &BookingDetails) -> eyre::Result<()>;
    }
}

/// Keeps every delivered notification in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|delivered| delivered.clone())
            .unwrap_or_default()
    }

    /// Polls until at least `count` notifications arrived or `timeout` passed.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Notification> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let delivered = self.delivered();
            if delivered.len() >= count || tokio::time::Instant::now() >= deadline {
                return delivered;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn record(&self, notification: Notification) {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(notification);
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn booking_confirmed(&self, details: &BookingDetails) -> eyre::Result<()> {
        self.record(Notification::BookingConfirmed(details.clone()));
        Ok(())
    }

    async fn booking_cancelled(&self, details: &BookingDetails) -> eyre::Result<()> {
        self.record(Notification::BookingCancelled(details.clone()));
        Ok(())
    }
}
