//! # Notification delivery
//!
//! Implementations of [`Notifier`] used by the server. Which one runs is
//! decided by `NOTIFY_WEBHOOK_URL`: with a URL, rendered emails are POSTed
//! to that relay; without one they are written to the log.

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use serde::Serialize;
use slotbook_core::{models::booking::BookingDetails, notify::Notifier};
use tracing::info;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// An email ready for the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn confirmation_email(details: &BookingDetails) -> EmailMessage {
    let body = format!(
        "Dear {customer},\n\n\
         Your appointment has been successfully booked.\n\n\
         Business: {business}\n\
         Service: {service}\n\
         Date & Time: {start} - {end}\n\n\
         If you need to cancel or reschedule, please log in to your account.\n\
         Thank you for choosing our service!\n",
        customer = details.customer_name,
        business = details.business_name,
        service = details.service_name,
        start = details.start_time.format(TIME_FORMAT),
        end = details.end_time.format(TIME_FORMAT),
    );

    EmailMessage {
        to: details.customer_email.clone(),
        subject: "Booking Confirmation".to_string(),
        body,
    }
}

pub fn cancellation_email(details: &BookingDetails) -> EmailMessage {
    let body = format!(
        "Dear {customer},\n\n\
         Your appointment has been cancelled.\n\n\
         Business: {business}\n\
         Service: {service}\n\
         Date & Time: {start}\n\n\
         If you would like to book a new appointment, please visit our website.\n",
        customer = details.customer_name,
        business = details.business_name,
        service = details.service_name,
        start = details.start_time.format(TIME_FORMAT),
    );

    EmailMessage {
        to: details.customer_email.clone(),
        subject: "Booking Cancelled".to_string(),
        body,
    }
}

/// Logs rendered emails instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    fn log(&self, details: &BookingDetails, message: &EmailMessage) {
        info!(
            booking_id = %details.id,
            to = %message.to,
            subject = %message.subject,
            "Email notification"
        );
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn booking_confirmed(&self, details: &BookingDetails) -> Result<()> {
        self.log(details, &confirmation_email(details));
        Ok(())
    }

    async fn booking_cancelled(&self, details: &BookingDetails) -> Result<()> {
        self.log(details, &cancellation_email(details));
        Ok(())
    }
}

/// Sends rendered emails to an HTTP email relay as JSON.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn send(&self, message: EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .wrap_err("Email relay request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(eyre::eyre!(
                "Email relay rejected message with {}: {}",
                status,
                error_text
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn booking_confirmed(&self, details: &BookingDetails) -> Result<()> {
        self.send(confirmation_email(details)).await
    }

    async fn booking_cancelled(&self, details: &BookingDetails) -> Result<()> {
        self.send(cancellation_email(details)).await
    }
}
