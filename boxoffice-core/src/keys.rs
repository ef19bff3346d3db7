//! Canonical cache/lock key derivation.
//!
//! Both keys are keyed on the (event, seat) pair. Decimal i64 segments with
//! `:` separators cannot collide across distinct pairs.

/// Key for the in-flight hold: shared by the lock service and the cache.
pub fn reservation_key(event_id: i64, seat_id: i64) -> String {
    format!("seat:{}:{}", event_id, seat_id)
}

/// Key for the post-commit denial marker.
pub fn booking_key(event_id: i64, seat_id: i64) -> String {
    format!("booking:{}:{}", event_id, seat_id)
}
