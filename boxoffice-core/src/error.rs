use thiserror::Error;

/// Everything a reserve/finalize/abort call can surface. No variant is
/// retried internally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// The pair is already committed (cache- or store-detected). Terminal
    /// for this (event, seat).
    #[error("seat {seat_id} for event {event_id} is already booked")]
    DuplicateBooking { event_id: i64, seat_id: i64 },

    /// A rival holder currently owns the hold. Retryable after backoff.
    #[error("seat {seat_id} for event {event_id} is held by another reservation")]
    SeatLocked { event_id: i64, seat_id: i64 },

    /// No active hold at finalize/abort time; the caller must re-reserve.
    #[error("no active reservation for seat {seat_id} of event {event_id}")]
    ReservationExpired { event_id: i64, seat_id: i64 },

    /// The hold exists but belongs to a different subject.
    #[error("reservation for seat {seat_id} of event {event_id} is held by another user")]
    NotLockHolder { event_id: i64, seat_id: i64 },

    /// Lock quorum could not be reached. Transient; distinct from SeatLocked.
    #[error("lock service unavailable: {0}")]
    LockServiceUnavailable(#[from] boxoffice_locks::LockError),

    #[error("persistent store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// The load-bearing reservation-record write failed.
    #[error("reservation cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),
}

/// Booking store failures. Duplicate detection must be distinguishable from
/// plain unavailability, per the store contract.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("booking already exists for this event and seat")]
    Duplicate,

    #[error("store error: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
#[error("cache error: {0}")]
pub struct CacheError(pub String);
