use std::sync::Arc;
use std::time::Duration;

use boxoffice_locks::{Acquire, LockService, LockToken};
use chrono::Utc;
use tracing::{info, warn};

use crate::cache::ReservationCache;
use crate::error::{CacheError, ReservationError, StoreError};
use crate::keys::{booking_key, reservation_key};
use crate::model::{Booking, BookingIntent, Reservation, ReservationRecord};
use crate::store::BookingStore;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a hold lives. Also the lock TTL and the reservation record's
    /// cache expiry, so a crashed client frees the seat without intervention.
    pub lock_ttl: Duration,
    /// Retention of the post-commit denial marker, long enough to absorb
    /// late duplicate retries.
    pub denial_ttl: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_secs(10),
            denial_ttl: Duration::from_secs(600),
        }
    }
}

/// Orchestrates the quorum lock, the cache and the booking store into the
/// two-phase reserve/finalize protocol. Stateless: every dependency is
/// injected and all coordination state lives in the external services, so
/// any number of instances across any number of hosts stay correct.
pub struct Coordinator {
    store: Arc<dyn BookingStore>,
    locks: Arc<dyn LockService>,
    cache: Arc<dyn ReservationCache>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn BookingStore>,
        locks: Arc<dyn LockService>,
        cache: Arc<dyn ReservationCache>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            locks,
            cache,
            config,
        }
    }

    /// Duplicate check, run at both reserve and finalize time (state can
    /// change between the two). Fast path first: the cache denial marker is
    /// O(1) and rejects most duplicates cheaply. The store query is the
    /// authoritative answer and catches the window where no marker exists.
    /// No side effects.
    async fn check_not_already_booked(
        &self,
        intent: &BookingIntent,
    ) -> Result<(), ReservationError> {
        match self.cache.get(&booking_key(intent.event_id, intent.seat_id)).await {
            Ok(Some(_)) => {
                return Err(ReservationError::DuplicateBooking {
                    event_id: intent.event_id,
                    seat_id: intent.seat_id,
                })
            }
            Ok(None) => {}
            // The marker is an optimization; a cache fault must not fail the
            // check while the authoritative layer is still reachable.
            Err(e) => warn!("denial marker lookup failed, falling through to store: {}", e),
        }

        let exists = self
            .store
            .exists_booking(intent.event_id, intent.seat_id)
            .await
            .map_err(ReservationError::StoreUnavailable)?;
        if exists {
            return Err(ReservationError::DuplicateBooking {
                event_id: intent.event_id,
                seat_id: intent.seat_id,
            });
        }
        Ok(())
    }

    /// Phase one: claim the seat. On success the caller owns a hold it must
    /// finalize (or abort) within the TTL window.
    pub async fn reserve(&self, intent: BookingIntent) -> Result<Reservation, ReservationError> {
        self.check_not_already_booked(&intent).await?;

        let key = reservation_key(intent.event_id, intent.seat_id);
        let token = match self.locks.acquire(&key, self.config.lock_ttl).await? {
            Acquire::Acquired(token) => token,
            Acquire::Contested => {
                return Err(ReservationError::SeatLocked {
                    event_id: intent.event_id,
                    seat_id: intent.seat_id,
                })
            }
        };

        let record = ReservationRecord {
            user_id: intent.user_id,
            token: token.clone(),
        };
        let value = serde_json::to_string(&record)
            .map_err(|e| CacheError(e.to_string()))?;
        // Record expiry mirrors the lock TTL: if this process dies here, the
        // seat frees itself.
        if let Err(e) = self.cache.set_ex(&key, &value, self.config.lock_ttl).await {
            if let Err(release_err) = self.locks.release(&key, &token).await {
                warn!("lock release after failed record write also failed: {}", release_err);
            }
            return Err(ReservationError::CacheUnavailable(e));
        }

        let expires_at = Utc::now() + chrono::Duration::seconds(self.config.lock_ttl.as_secs() as i64);
        info!(
            "seat {} of event {} held by user {} until {}",
            intent.seat_id, intent.event_id, intent.user_id, expires_at
        );
        Ok(Reservation {
            intent,
            token,
            expires_at,
        })
    }

    /// Phase two: convert a valid hold into a durable booking.
    pub async fn finalize(&self, intent: BookingIntent) -> Result<Booking, ReservationError> {
        let key = reservation_key(intent.event_id, intent.seat_id);

        let raw = self.cache.get(&key).await?.ok_or(ReservationError::ReservationExpired {
            event_id: intent.event_id,
            seat_id: intent.seat_id,
        })?;
        let record: ReservationRecord = serde_json::from_str(&raw)
            .map_err(|e| ReservationError::CacheUnavailable(CacheError(e.to_string())))?;

        if record.user_id != intent.user_id {
            // Stale client retrying after expiry and re-acquisition by someone
            // else. The current holder's record stays untouched.
            return Err(ReservationError::NotLockHolder {
                event_id: intent.event_id,
                seat_id: intent.seat_id,
            });
        }

        // Re-validation: a booking may have been committed through another
        // path since reserve (admin insert, rival finalizer). Catching it
        // here beats burning a doomed store insert.
        if let Err(err) = self.check_not_already_booked(&intent).await {
            if matches!(err, ReservationError::DuplicateBooking { .. }) {
                // The seat can never be booked by anyone; holding the lock
                // for the rest of the TTL helps nobody.
                self.abandon_hold(&key, &record.token).await;
            }
            return Err(err);
        }

        let booking = match self.store.insert_booking(&intent).await {
            Ok(booking) => booking,
            Err(StoreError::Duplicate) => {
                // Unique-constraint backstop fired: a rival won the race
                // between the check above and this insert.
                self.abandon_hold(&key, &record.token).await;
                return Err(ReservationError::DuplicateBooking {
                    event_id: intent.event_id,
                    seat_id: intent.seat_id,
                });
            }
            Err(e) => {
                self.abandon_hold(&key, &record.token).await;
                return Err(ReservationError::StoreUnavailable(e));
            }
        };

        // The row is the durable source of truth. Nothing below may undo it;
        // failures are logged and swallowed.
        let marker_key = booking_key(intent.event_id, intent.seat_id);
        if let Err(e) = self
            .cache
            .set_ex(&marker_key, &booking.id.to_string(), self.config.denial_ttl)
            .await
        {
            warn!("denial marker write failed for {}: {}", marker_key, e);
        }
        self.abandon_hold(&key, &record.token).await;

        info!(
            "booking {} committed: seat {} of event {} for user {}",
            booking.id, intent.seat_id, intent.event_id, intent.user_id
        );
        Ok(booking)
    }

    /// Release a hold early instead of waiting out the TTL. Frees contested
    /// seats faster; never touches a hold owned by someone else.
    pub async fn abort(&self, intent: BookingIntent) -> Result<(), ReservationError> {
        let key = reservation_key(intent.event_id, intent.seat_id);

        let raw = self.cache.get(&key).await?.ok_or(ReservationError::ReservationExpired {
            event_id: intent.event_id,
            seat_id: intent.seat_id,
        })?;
        let record: ReservationRecord = serde_json::from_str(&raw)
            .map_err(|e| ReservationError::CacheUnavailable(CacheError(e.to_string())))?;

        if record.user_id != intent.user_id {
            return Err(ReservationError::NotLockHolder {
                event_id: intent.event_id,
                seat_id: intent.seat_id,
            });
        }

        self.abandon_hold(&key, &record.token).await;
        info!(
            "hold on seat {} of event {} aborted by user {}",
            intent.seat_id, intent.event_id, intent.user_id
        );
        Ok(())
    }

    /// Best-effort teardown of a hold: drop the cache record, release the
    /// lock. Both expire on their own, so failure is only worth a warning.
    async fn abandon_hold(&self, key: &str, token: &LockToken) {
        if let Err(e) = self.cache.del(key).await {
            warn!("reservation record delete failed for {}: {}", key, e);
        }
        if let Err(e) = self.locks.release(key, token).await {
            warn!("lock release failed for {}: {}", key, e);
        }
    }
}
