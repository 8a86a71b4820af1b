pub mod bookings;
pub mod health;
pub mod payments;
pub mod reviews;
pub mod slots;
