use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use boxoffice_locks::MemoryLockService;
use tokio::time::Instant;
use uuid::Uuid;

use crate::cache::ReservationCache;
use crate::coordinator::{Coordinator, CoordinatorConfig};
use crate::error::{CacheError, ReservationError, StoreError};
use crate::keys::reservation_key;
use crate::model::{Booking, BookingIntent};
use crate::store::BookingStore;

/// In-memory stand-in for the persistent store, with an out-of-band insert
/// path to exercise the finalize-time re-check.
#[derive(Default)]
struct MemoryBookingStore {
    rows: Mutex<HashMap<(i64, i64), Booking>>,
}

impl MemoryBookingStore {
    fn insert_out_of_band(&self, user_id: i64, event_id: i64, seat_id: i64) {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(
            (event_id, seat_id),
            Booking {
                id: Uuid::new_v4(),
                user_id,
                event_id,
                seat_id,
                created_at: chrono::Utc::now(),
            },
        );
    }

    fn booking_count(&self, event_id: i64, seat_id: i64) -> usize {
        let rows = self.rows.lock().unwrap();
        usize::from(rows.contains_key(&(event_id, seat_id)))
    }

    fn clear(&self) {
        self.rows.lock().unwrap().clear();
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert_booking(&self, intent: &BookingIntent) -> Result<Booking, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&(intent.event_id, intent.seat_id)) {
            return Err(StoreError::Duplicate);
        }
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: intent.user_id,
            event_id: intent.event_id,
            seat_id: intent.seat_id,
            created_at: chrono::Utc::now(),
        };
        rows.insert((intent.event_id, intent.seat_id), booking.clone());
        Ok(booking)
    }

    async fn exists_booking(&self, event_id: i64, seat_id: i64) -> Result<bool, StoreError> {
        Ok(self.rows.lock().unwrap().contains_key(&(event_id, seat_id)))
    }
}

/// Expiring key-value fake on tokio time, with a write-failure switch.
#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    fail_writes: AtomicBool,
}

#[async_trait]
impl ReservationCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError("injected write failure".to_string()));
        }
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

struct Harness {
    coordinator: Arc<Coordinator>,
    store: Arc<MemoryBookingStore>,
    locks: MemoryLockService,
    cache: Arc<MemoryCache>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryBookingStore::default());
    let locks = MemoryLockService::new(3);
    let cache = Arc::new(MemoryCache::default());
    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        Arc::new(locks.clone()),
        cache.clone(),
        CoordinatorConfig::default(),
    ));
    Harness {
        coordinator,
        store,
        locks,
        cache,
    }
}

fn intent(user_id: i64) -> BookingIntent {
    BookingIntent {
        user_id,
        event_id: 5,
        seat_id: 12,
    }
}

#[tokio::test]
async fn reserve_finalize_then_rival_sees_duplicate() {
    let h = harness();

    let hold = h.coordinator.reserve(intent(1)).await.unwrap();
    assert_eq!(hold.intent.user_id, 1);

    let booking = h.coordinator.finalize(intent(1)).await.unwrap();
    assert_eq!(booking.event_id, 5);
    assert_eq!(booking.seat_id, 12);

    let err = h.coordinator.reserve(intent(2)).await.unwrap_err();
    assert!(matches!(
        err,
        ReservationError::DuplicateBooking { event_id: 5, seat_id: 12 }
    ));
    assert_eq!(h.store.booking_count(5, 12), 1);
}

#[tokio::test]
async fn rival_reserve_is_contested_and_its_finalize_rejected() {
    let h = harness();

    h.coordinator.reserve(intent(1)).await.unwrap();

    let err = h.coordinator.reserve(intent(2)).await.unwrap_err();
    assert!(matches!(err, ReservationError::SeatLocked { .. }));

    let err = h.coordinator.finalize(intent(2)).await.unwrap_err();
    assert!(matches!(err, ReservationError::NotLockHolder { .. }));
    assert_eq!(h.store.booking_count(5, 12), 0);
}

#[tokio::test]
async fn at_most_one_commit_across_concurrent_attempts() {
    let h = harness();

    let mut handles = Vec::new();
    for user_id in 1..=8 {
        let coordinator = h.coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator.reserve(intent(user_id)).await?;
            coordinator.finalize(intent(user_id)).await
        }));
    }

    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(
                ReservationError::SeatLocked { .. }
                | ReservationError::DuplicateBooking { .. }
                | ReservationError::ReservationExpired { .. },
            ) => {}
            Err(other) => panic!("unexpected loser outcome: {other}"),
        }
    }

    assert_eq!(committed, 1);
    assert_eq!(h.store.booking_count(5, 12), 1);
}

#[tokio::test(start_paused = true)]
async fn unfinalized_hold_self_releases_at_ttl() {
    let h = harness();

    h.coordinator.reserve(intent(1)).await.unwrap();

    let err = h.coordinator.reserve(intent(2)).await.unwrap_err();
    assert!(matches!(err, ReservationError::SeatLocked { .. }));

    tokio::time::advance(Duration::from_secs(11)).await;

    h.coordinator.reserve(intent(2)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn finalize_after_expiry_is_reservation_expired() {
    let h = harness();

    h.coordinator.reserve(intent(1)).await.unwrap();
    tokio::time::advance(Duration::from_secs(11)).await;

    let err = h.coordinator.finalize(intent(1)).await.unwrap_err();
    assert!(matches!(err, ReservationError::ReservationExpired { .. }));
    assert_eq!(h.store.booking_count(5, 12), 0);
}

#[tokio::test]
async fn wrong_subject_cannot_finalize_and_record_survives() {
    let h = harness();

    h.coordinator.reserve(intent(1)).await.unwrap();

    let err = h.coordinator.finalize(intent(2)).await.unwrap_err();
    assert!(matches!(err, ReservationError::NotLockHolder { .. }));
    assert_eq!(h.store.booking_count(5, 12), 0);

    // The rightful holder's record was left untouched.
    h.coordinator.finalize(intent(1)).await.unwrap();
    assert_eq!(h.store.booking_count(5, 12), 1);
}

#[tokio::test]
async fn out_of_band_insert_fails_finalize_not_a_second_row() {
    let h = harness();

    h.coordinator.reserve(intent(1)).await.unwrap();
    // Booking lands directly in the store, bypassing the coordinator.
    h.store.insert_out_of_band(99, 5, 12);

    let err = h.coordinator.finalize(intent(1)).await.unwrap_err();
    assert!(matches!(err, ReservationError::DuplicateBooking { .. }));
    assert_eq!(h.store.booking_count(5, 12), 1);

    // The doomed hold was torn down rather than left to run out the TTL.
    assert!(!h.locks.is_locked(&reservation_key(5, 12)));
}

#[tokio::test]
async fn denial_marker_rejects_without_store_lookup() {
    let h = harness();

    h.coordinator.reserve(intent(1)).await.unwrap();
    h.coordinator.finalize(intent(1)).await.unwrap();

    // Even with the authoritative row gone, the marker still rejects early.
    h.store.clear();
    let err = h.coordinator.reserve(intent(2)).await.unwrap_err();
    assert!(matches!(err, ReservationError::DuplicateBooking { .. }));
}

#[tokio::test]
async fn abort_frees_the_seat_early() {
    let h = harness();

    h.coordinator.reserve(intent(1)).await.unwrap();
    h.coordinator.abort(intent(1)).await.unwrap();

    // No TTL wait needed.
    h.coordinator.reserve(intent(2)).await.unwrap();
}

#[tokio::test]
async fn abort_checks_ownership_and_liveness() {
    let h = harness();

    let err = h.coordinator.abort(intent(1)).await.unwrap_err();
    assert!(matches!(err, ReservationError::ReservationExpired { .. }));

    h.coordinator.reserve(intent(1)).await.unwrap();
    let err = h.coordinator.abort(intent(2)).await.unwrap_err();
    assert!(matches!(err, ReservationError::NotLockHolder { .. }));

    // Still held by user 1.
    let err = h.coordinator.reserve(intent(3)).await.unwrap_err();
    assert!(matches!(err, ReservationError::SeatLocked { .. }));
}

#[tokio::test]
async fn failed_record_write_does_not_wedge_the_seat() {
    let h = harness();

    h.cache.fail_writes.store(true, Ordering::SeqCst);
    let err = h.coordinator.reserve(intent(1)).await.unwrap_err();
    assert!(matches!(err, ReservationError::CacheUnavailable(_)));

    // The lock acquired before the failed write was released.
    h.cache.fail_writes.store(false, Ordering::SeqCst);
    h.coordinator.reserve(intent(2)).await.unwrap();
}
