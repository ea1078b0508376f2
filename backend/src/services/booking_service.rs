//! Operations exposed to transports (HTTP handlers, tests, tools).
//!
//! Every function takes the repository handle explicitly and returns a
//! [`BookingResult`]; transports only translate inputs and map errors.

use chrono::{DateTime, NaiveDate, Utc};
use log::info;

use super::availability;
use super::ledger;
use super::slots::{self, AvailableSlots};
use super::validator;
use crate::db::repository::FullRepository;
use crate::error::{BookingError, BookingResult};
use crate::models::{
    parse_timezone, AvailabilityWindow, Booking, BookingId, Coach, CoachId, NewCoach, UserId,
};

/// Register a coach. The timezone must be a known IANA identifier.
pub async fn create_coach<R>(repo: &R, name: &str, timezone: &str) -> BookingResult<Coach>
where
    R: FullRepository + ?Sized,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(BookingError::MalformedInput(
            "name must not be empty".to_string(),
        ));
    }
    let tz = parse_timezone(timezone.trim())?;

    let coach = repo
        .insert_coach(&NewCoach {
            name: name.to_string(),
            timezone: tz.name().to_string(),
        })
        .await?;
    info!("coach {} created in {}", coach.id, coach.timezone);
    Ok(coach)
}

/// Add a weekly availability window from raw `day` and `"HH:MM"` inputs.
pub async fn add_availability<R>(
    repo: &R,
    coach_id: CoachId,
    day: i64,
    start_time: &str,
    end_time: &str,
) -> BookingResult<AvailabilityWindow>
where
    R: FullRepository + ?Sized,
{
    availability::add_window(repo, coach_id, day, start_time, end_time).await
}

/// Open slots for the coach on `local_date`, interpreted in the coach's timezone.
pub async fn query_slots<R>(
    repo: &R,
    coach_id: CoachId,
    local_date: NaiveDate,
) -> BookingResult<AvailableSlots>
where
    R: FullRepository + ?Sized,
{
    slots::available_slots(repo, coach_id, local_date).await
}

/// Book the slot starting at `instant` (RFC 3339 with offset).
pub async fn create_booking<R>(
    repo: &R,
    user_id: UserId,
    coach_id: CoachId,
    instant: &str,
) -> BookingResult<Booking>
where
    R: FullRepository + ?Sized,
{
    validator::validate_and_book(repo, user_id, coach_id, instant).await
}

/// Upcoming bookings of a user from `from` onwards.
pub async fn list_user_bookings<R>(
    repo: &R,
    user_id: UserId,
    from: DateTime<Utc>,
) -> BookingResult<Vec<Booking>>
where
    R: FullRepository + ?Sized,
{
    ledger::list_for_user(repo, user_id, from).await
}

/// Cancel a booking; an unknown id is [`BookingError::NotFound`].
pub async fn cancel_booking<R>(repo: &R, booking_id: BookingId) -> BookingResult<()>
where
    R: FullRepository + ?Sized,
{
    if ledger::cancel(repo, booking_id).await? {
        Ok(())
    } else {
        Err(BookingError::NotFound(booking_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_create_coach_validation() {
        let repo = LocalRepository::new();
        assert_eq!(
            create_coach(&repo, "  ", "UTC").await.unwrap_err().kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            create_coach(&repo, "Bo", "Europe/Atlantis")
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidTimezone
        );

        let coach = create_coach(&repo, " Bo ", "Europe/Berlin").await.unwrap();
        assert_eq!(coach.name, "Bo");
        assert_eq!(coach.timezone, "Europe/Berlin");
    }

    #[tokio::test]
    async fn test_cancel_unknown_booking() {
        let repo = LocalRepository::new();
        let err = cancel_booking(&repo, BookingId::new(5)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
