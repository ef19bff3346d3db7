use boxoffice_locks::LockToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client's wish to claim one seat for one event. Request payload and
/// coordinator-internal state only; never persisted as-is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookingIntent {
    pub user_id: i64,
    pub event_id: i64,
    pub seat_id: i64,
}

/// The cache-resident half of a hold, stored as JSON at the reservation key
/// with TTL equal to the lock TTL. At most one exists per (event, seat);
/// the lock enforces that, not the cache write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub user_id: i64,
    pub token: LockToken,
}

/// The hold handed back from `reserve`. The caller must finalize (or abort)
/// before `expires_at`, after which the seat frees itself.
#[derive(Debug, Serialize)]
pub struct Reservation {
    #[serde(flatten)]
    pub intent: BookingIntent,
    #[serde(skip)]
    pub token: LockToken,
    pub expires_at: DateTime<Utc>,
}

/// A durable, committed booking. At most one row may ever exist per
/// (event_id, seat_id); a DB unique constraint is the final backstop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: i64,
    pub event_id: i64,
    pub seat_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub venue_id: i64,
    pub artist_id: i64,
    pub occurring_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub venue_id: i64,
}
