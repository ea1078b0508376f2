//! Acceptance pipeline for booking requests.
//!
//! A request moves through
//! `Received -> TimeParsed -> BoundaryChecked -> AvailabilityChecked -> Inserted`
//! and stops at the first failing stage. The boundary check runs before any
//! storage access, so a misaligned instant is rejected even for an unknown coach.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use log::{debug, info};

use super::availability::{coach_timezone, windows_for};
use super::ledger;
use crate::db::repository::FullRepository;
use crate::error::{BookingError, BookingResult};
use crate::models::{
    format_instant, is_slot_aligned, parse_instant, slot_duration, Booking, CoachId, UserId,
    Weekday,
};

/// Stages of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStage {
    Received,
    TimeParsed,
    BoundaryChecked,
    AvailabilityChecked,
    Inserted,
}

impl fmt::Display for BookingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::TimeParsed => "time_parsed",
            Self::BoundaryChecked => "boundary_checked",
            Self::AvailabilityChecked => "availability_checked",
            Self::Inserted => "inserted",
        };
        f.write_str(name)
    }
}

/// Reject instants that are not on a UTC :00 or :30 mark.
pub fn check_boundary(requested: DateTime<Utc>) -> BookingResult<()> {
    if is_slot_aligned(requested) {
        Ok(())
    } else {
        Err(BookingError::BoundaryViolation(format_instant(requested)))
    }
}

/// Accept `requested` if the whole slot fits inside one of the coach's windows
/// for the local date it falls on.
pub async fn check_availability<R>(
    repo: &R,
    coach_id: CoachId,
    requested: DateTime<Utc>,
) -> BookingResult<()>
where
    R: FullRepository + ?Sized,
{
    let tz = coach_timezone(repo, coach_id).await?;
    let local = requested.with_timezone(&tz);
    let date = local.date_naive();
    let weekday = Weekday::from_chrono(local.weekday());
    let slot_end = requested + slot_duration();

    for window in windows_for(repo, coach_id, weekday).await? {
        let (start, end) = window.anchor(date, tz)?;
        if requested >= start && slot_end <= end {
            debug!(
                "{} fits availability {} of coach {}",
                format_instant(requested),
                window.id,
                coach_id
            );
            return Ok(());
        }
    }

    Err(BookingError::OutsideAvailability(format_instant(requested)))
}

/// Run a booking request through every stage.
///
/// On success the returned booking carries the canonical UTC start, not the
/// caller's string.
pub async fn validate_and_book<R>(
    repo: &R,
    user_id: UserId,
    coach_id: CoachId,
    raw_instant: &str,
) -> BookingResult<Booking>
where
    R: FullRepository + ?Sized,
{
    let mut stage = BookingStage::Received;
    let outcome = run_stages(repo, user_id, coach_id, raw_instant, &mut stage).await;
    match &outcome {
        Ok(booking) => debug!("booking {} reached stage {}", booking.id, stage),
        Err(e) if e.is_validation() => debug!(
            "booking request by user {} for coach {} at '{}' rejected after {}: {}",
            user_id, coach_id, raw_instant, stage, e
        ),
        Err(e) => info!(
            "booking request by user {} for coach {} at '{}' failed after {}: {}",
            user_id, coach_id, raw_instant, stage, e
        ),
    }
    outcome
}

async fn run_stages<R>(
    repo: &R,
    user_id: UserId,
    coach_id: CoachId,
    raw_instant: &str,
    stage: &mut BookingStage,
) -> BookingResult<Booking>
where
    R: FullRepository + ?Sized,
{
    let requested = parse_instant(raw_instant)?;
    *stage = BookingStage::TimeParsed;

    check_boundary(requested)?;
    *stage = BookingStage::BoundaryChecked;

    check_availability(repo, coach_id, requested).await?;
    *stage = BookingStage::AvailabilityChecked;

    let booking =
        ledger::try_insert(repo, user_id, coach_id, requested, requested + slot_duration())
            .await?;
    *stage = BookingStage::Inserted;
    Ok(booking)
}
