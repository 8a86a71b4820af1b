use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Time slot is not available")]
    SlotUnavailable,

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Review already submitted for this booking")]
    DuplicateReview,

    #[error("Cannot delete booked time slot")]
    SlotBooked,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Stable classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    AccessDenied,
    Validation,
    Authentication,
    Internal,
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::SlotUnavailable
            | BookingError::AlreadyCancelled
            | BookingError::DuplicateReview
            | BookingError::SlotBooked
            | BookingError::Conflict(_) => ErrorKind::Conflict,
            BookingError::Validation(_) => ErrorKind::Validation,
            BookingError::Authentication(_) => ErrorKind::Authentication,
            BookingError::AccessDenied(_) => ErrorKind::AccessDenied,
            BookingError::Database(_) | BookingError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand to an external caller.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
