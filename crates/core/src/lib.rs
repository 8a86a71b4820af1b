//! # SlotBook Core
//!
//! Domain types and the booking transaction logic for the SlotBook
//! appointment marketplace. Persistence is reached only through the
//! [`store::BookingStore`] seam, so the same coordinator runs against
//! PostgreSQL in production and an in-memory store in tests.

pub mod coordinator;
pub mod errors;
pub mod models;
pub mod notify;
pub mod rating;
pub mod store;
