pub mod actor;
pub mod booking;
pub mod business;
pub mod payment;
pub mod review;
pub mod time_slot;

/// Plain acknowledgement body used by state-changing endpoints.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
