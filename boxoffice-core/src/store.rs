use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Booking, BookingIntent};

/// The single source of truth for committed bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Transactionally insert a booking. A duplicate (event, seat) pair must
    /// come back as `StoreError::Duplicate`, not as a generic failure.
    async fn insert_booking(&self, intent: &BookingIntent) -> Result<Booking, StoreError>;

    /// Authoritative existence check for a committed (event, seat) pair.
    async fn exists_booking(&self, event_id: i64, seat_id: i64) -> Result<bool, StoreError>;
}
