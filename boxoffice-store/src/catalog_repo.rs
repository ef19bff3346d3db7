use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Plain CRUD over the catalog entities (venues, artists, events, seats,
/// users). No coordination logic lives here.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Seed one venue, one artist, one event, `seats` seats and `users`
    /// users. Returns the seeded event id.
    pub async fn seed(&self, seats: i64, users: i64) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let artist_id: i64 =
            sqlx::query_scalar("INSERT INTO artists (name) VALUES ($1) RETURNING id")
                .bind("Dropkick Murphys")
                .fetch_one(&mut *tx)
                .await?;

        let venue_id: i64 = sqlx::query_scalar(
            "INSERT INTO venues (name, description, address) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind("Norva")
        .bind("Very hip venue downtown Norfolk")
        .bind("100 Granby Ave")
        .fetch_one(&mut *tx)
        .await?;

        let event_id: i64 = sqlx::query_scalar(
            "INSERT INTO events (venue_id, artist_id, occurring_at) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(venue_id)
        .bind(artist_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO seats (venue_id) SELECT $1 FROM generate_series(1, $2)")
            .bind(venue_id)
            .bind(seats)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO users (created_at) SELECT now() FROM generate_series(1, $1)")
            .bind(users)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("seeded event {} with {} seats and {} users", event_id, seats, users);
        Ok(event_id)
    }

    /// Clear every table, bookings included.
    pub async fn truncate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "TRUNCATE bookings, events, seats, users, artists, venues RESTART IDENTITY CASCADE",
        )
        .execute(&self.pool)
        .await?;
        info!("catalog truncated");
        Ok(())
    }
}
