//! The booking ledger: reads and the single atomic write.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::db::repository::BookingRepository;
use crate::error::{BookingError, BookingResult};
use crate::models::{format_instant, Booking, BookingId, CoachId, NewBooking, UserId};

/// Booked start instants of a coach within `[start, end)`.
pub async fn bookings_in_range<R>(
    repo: &R,
    coach_id: CoachId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BookingResult<HashSet<DateTime<Utc>>>
where
    R: BookingRepository + ?Sized,
{
    let starts = repo.bookings_in_range(coach_id, start, end).await?;
    Ok(starts.into_iter().collect())
}

/// Record a booking; a lost uniqueness race becomes [`BookingError::SlotConflict`].
///
/// No retry happens here.
pub async fn try_insert<R>(
    repo: &R,
    user_id: UserId,
    coach_id: CoachId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BookingResult<Booking>
where
    R: BookingRepository + ?Sized,
{
    let booking = NewBooking {
        user_id,
        coach_id,
        start,
        end,
    };
    match repo.insert_booking_atomic(&booking).await {
        Ok(stored) => {
            info!(
                "booking {} created: coach {} at {} for user {}",
                stored.id,
                coach_id,
                format_instant(start),
                user_id
            );
            Ok(stored)
        }
        Err(e) if e.is_conflict() => {
            warn!(
                "slot {} already booked for coach {}",
                format_instant(start),
                coach_id
            );
            Err(BookingError::SlotConflict {
                coach_id,
                start: format_instant(start),
            })
        }
        Err(e) => Err(BookingError::StorageError(e)),
    }
}

/// Delete a booking; returns whether one existed.
pub async fn cancel<R>(repo: &R, booking_id: BookingId) -> BookingResult<bool>
where
    R: BookingRepository + ?Sized,
{
    let removed = repo.delete_booking(booking_id).await? > 0;
    if removed {
        info!("booking {} cancelled", booking_id);
    }
    Ok(removed)
}

/// A user's bookings starting at or after `from`, ascending by start.
pub async fn list_for_user<R>(
    repo: &R,
    user_id: UserId,
    from: DateTime<Utc>,
) -> BookingResult<Vec<Booking>>
where
    R: BookingRepository + ?Sized,
{
    Ok(repo.bookings_for_user(user_id, from).await?)
}
