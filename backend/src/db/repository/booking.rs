//! The booking ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::models::{Booking, BookingId, CoachId, NewBooking, UserId};

/// Repository trait for booking rows.
///
/// [`insert_booking_atomic`](BookingRepository::insert_booking_atomic) is the
/// one capability every backend must get right: at most one booking may exist
/// per `(coach_id, start)` and a losing writer must see
/// `RepositoryError::ConflictError`.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Start instants of a coach's bookings within `[start, end)`.
    async fn bookings_in_range(
        &self,
        coach_id: CoachId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<DateTime<Utc>>>;

    /// Insert a booking inside a transaction guarded by the
    /// `(coach_id, start)` uniqueness constraint.
    ///
    /// # Returns
    /// * `Ok(Booking)` - The stored row with its assigned id
    /// * `Err(RepositoryError::ConflictError)` - The slot is already taken
    /// * `Err(RepositoryError)` - Any other storage failure
    async fn insert_booking_atomic(&self, booking: &NewBooking) -> RepositoryResult<Booking>;

    /// Delete a booking, returning the number of rows removed (0 or 1).
    async fn delete_booking(&self, booking_id: BookingId) -> RepositoryResult<usize>;

    /// A user's bookings starting at or after `from`, ascending by start.
    async fn bookings_for_user(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Booking>>;
}
