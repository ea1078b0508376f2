//! In-memory local repository implementation.
//!
//! All data lives behind a single [`parking_lot::RwLock`], which makes the
//! booking insert atomic: the uniqueness check and the insert happen under the
//! same write guard, mirroring the `(coach_id, start_time)` unique index of the
//! Postgres backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    AvailabilityId, AvailabilityWindow, Booking, BookingId, Coach, CoachId, NewAvailabilityWindow,
    NewBooking, NewCoach, UserId, Weekday,
};

/// In-memory local repository.
///
/// Ideal for unit tests and local development that need isolation and speed.
/// Cloning shares the underlying data.
///
/// # Example
/// ```
/// use coach_booking::db::repositories::LocalRepository;
/// use coach_booking::db::repository::CoachRepository;
/// use coach_booking::models::NewCoach;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let repo = LocalRepository::new();
/// let coach = repo
///     .insert_coach(&NewCoach {
///         name: "Asha".to_string(),
///         timezone: "Asia/Kolkata".to_string(),
///     })
///     .await
///     .unwrap();
/// assert_eq!(repo.lookup_coach_timezone(coach.id).await.unwrap(), "Asia/Kolkata");
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    coaches: BTreeMap<CoachId, Coach>,
    windows: BTreeMap<AvailabilityId, AvailabilityWindow>,
    bookings: BTreeMap<BookingId, Booking>,

    // ID counters
    next_coach_id: i64,
    next_availability_id: i64,
    next_booking_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            coaches: BTreeMap::new(),
            windows: BTreeMap::new(),
            bookings: BTreeMap::new(),
            next_coach_id: 1,
            next_availability_id: 1,
            next_booking_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy every operation except `health_check` fails with a
    /// retryable connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn coach_count(&self) -> usize {
        self.data.read().coaches.len()
    }

    pub fn booking_count(&self) -> usize {
        self.data.read().bookings.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoachRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_coach(&self, coach: &NewCoach) -> RepositoryResult<Coach> {
        self.check_health("insert_coach")?;
        let mut data = self.data.write();
        let id = CoachId::new(data.next_coach_id);
        data.next_coach_id += 1;

        let stored = Coach {
            id,
            name: coach.name.clone(),
            timezone: coach.timezone.clone(),
            created_at: Utc::now(),
        };
        data.coaches.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_coach(&self, coach_id: CoachId) -> RepositoryResult<Coach> {
        self.check_health("get_coach")?;
        self.data
            .read()
            .coaches
            .get(&coach_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Coach {} not found", coach_id),
                    ErrorContext::new("get_coach")
                        .with_entity("coach")
                        .with_entity_id(coach_id),
                )
            })
    }

    async fn lookup_coach_timezone(&self, coach_id: CoachId) -> RepositoryResult<String> {
        self.get_coach(coach_id)
            .await
            .map(|coach| coach.timezone)
            .map_err(|e| e.with_operation("lookup_coach_timezone"))
    }
}

#[async_trait]
impl AvailabilityRepository for LocalRepository {
    async fn insert_availability(
        &self,
        window: &NewAvailabilityWindow,
    ) -> RepositoryResult<AvailabilityWindow> {
        self.check_health("insert_availability")?;
        let mut data = self.data.write();
        let id = AvailabilityId::new(data.next_availability_id);
        data.next_availability_id += 1;

        let stored = AvailabilityWindow {
            id,
            coach_id: window.coach_id,
            weekday: window.weekday,
            start: window.start,
            end: window.end,
            created_at: Utc::now(),
        };
        data.windows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn windows_for(
        &self,
        coach_id: CoachId,
        weekday: Weekday,
    ) -> RepositoryResult<Vec<AvailabilityWindow>> {
        self.check_health("windows_for")?;
        // BTreeMap iteration is ascending by id, i.e. creation order.
        Ok(self
            .data
            .read()
            .windows
            .values()
            .filter(|w| w.coach_id == coach_id && w.weekday == weekday)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingRepository for LocalRepository {
    async fn bookings_in_range(
        &self,
        coach_id: CoachId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<DateTime<Utc>>> {
        self.check_health("bookings_in_range")?;
        Ok(self
            .data
            .read()
            .bookings
            .values()
            .filter(|b| b.coach_id == coach_id && b.start >= start && b.start < end)
            .map(|b| b.start)
            .collect())
    }

    async fn insert_booking_atomic(&self, booking: &NewBooking) -> RepositoryResult<Booking> {
        self.check_health("insert_booking_atomic")?;
        let mut data = self.data.write();

        let taken = data
            .bookings
            .values()
            .any(|b| b.coach_id == booking.coach_id && b.start == booking.start);
        if taken {
            return Err(RepositoryError::conflict_with_context(
                "duplicate key value violates unique constraint \"bookings_coach_start_key\"",
                ErrorContext::new("insert_booking_atomic")
                    .with_entity("booking")
                    .with_details(format!("coach_id={}, start={}", booking.coach_id, booking.start)),
            ));
        }

        let id = BookingId::new(data.next_booking_id);
        data.next_booking_id += 1;
        let stored = Booking {
            id,
            user_id: booking.user_id,
            coach_id: booking.coach_id,
            start: booking.start,
            end: booking.end,
            created_at: Utc::now(),
        };
        data.bookings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_booking(&self, booking_id: BookingId) -> RepositoryResult<usize> {
        self.check_health("delete_booking")?;
        let removed = self.data.write().bookings.remove(&booking_id);
        Ok(usize::from(removed.is_some()))
    }

    async fn bookings_for_user(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Booking>> {
        self.check_health("bookings_for_user")?;
        let mut rows: Vec<Booking> = self
            .data
            .read()
            .bookings
            .values()
            .filter(|b| b.user_id == user_id && b.start >= from)
            .cloned()
            .collect();
        rows.sort_by_key(|b| (b.start, b.id));
        Ok(rows)
    }
}
