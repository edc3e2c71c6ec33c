pub mod booking;

pub use booking::{Booking, BookingRequest, NewBooking, Service, Slot};
