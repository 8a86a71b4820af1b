mod test_utils;

mod bookings_test;
mod middleware_test;
mod payments_test;
mod reviews_test;
mod slots_test;
