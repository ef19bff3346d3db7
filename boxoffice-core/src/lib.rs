//! Seat-reservation coordination: the two-phase reserve/finalize protocol
//! that guarantees at most one committed booking per (event, seat), combining
//! a quorum lock, a fast cache check, and the authoritative store check.

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod keys;
pub mod model;
pub mod store;

#[cfg(test)]
mod coordinator_tests;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use error::ReservationError;
pub use model::{Booking, BookingIntent, Reservation};
