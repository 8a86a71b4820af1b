pub mod bookings;
pub mod payments;
pub mod reviews;
pub mod slots;
