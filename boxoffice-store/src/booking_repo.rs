use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use boxoffice_core::error::StoreError;
use boxoffice_core::model::{Booking, BookingIntent};
use boxoffice_core::store::BookingStore;

/// Postgres-backed booking store. The `UNIQUE (event_id, seat_id)` constraint
/// on `bookings` is the final backstop if the lock layer is ever bypassed.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: Pool<Postgres>,
}

impl PgBookingStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert_booking(&self, intent: &BookingIntent) -> Result<Booking, StoreError> {
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: intent.user_id,
            event_id: intent.event_id,
            seat_id: intent.seat_id,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, event_id, seat_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.event_id)
        .bind(booking.seat_id)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(booking),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate)
            }
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }

    async fn exists_booking(&self, event_id: i64, seat_id: i64) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE event_id = $1 AND seat_id = $2)",
        )
        .bind(event_id)
        .bind(seat_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(exists)
    }
}
