pub mod booking;
pub mod business;
pub mod payment;
pub mod review;
pub mod time_slot;
