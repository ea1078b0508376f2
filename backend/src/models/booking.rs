//! Domain entities: coaches, recurring availability windows and bookings.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::time::{local_to_utc, slot_duration, LocalTime, Weekday};
use crate::define_id_type;
use crate::error::{BookingError, BookingResult};

define_id_type!(i64, CoachId);
define_id_type!(i64, AvailabilityId);
define_id_type!(i64, BookingId);
define_id_type!(i64, UserId);

/// A coach and the IANA timezone their availability is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coach {
    pub id: CoachId,
    pub name: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

/// Coach fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCoach {
    pub name: String,
    pub timezone: String,
}

/// A recurring weekly interval `[start, end)` in the coach's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: AvailabilityId,
    pub coach_id: CoachId,
    pub weekday: Weekday,
    pub start: LocalTime,
    pub end: LocalTime,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityWindow {
    /// Pin the window onto a concrete local date, returning its UTC bounds.
    pub fn anchor(&self, date: NaiveDate, tz: Tz) -> BookingResult<(DateTime<Utc>, DateTime<Utc>)> {
        Ok((local_to_utc(date, self.start, tz)?, local_to_utc(date, self.end, tz)?))
    }
}

/// Availability fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAvailabilityWindow {
    pub coach_id: CoachId,
    pub weekday: Weekday,
    pub start: LocalTime,
    pub end: LocalTime,
}

impl NewAvailabilityWindow {
    pub fn new(
        coach_id: CoachId,
        weekday: Weekday,
        start: LocalTime,
        end: LocalTime,
    ) -> BookingResult<Self> {
        if start >= end {
            return Err(BookingError::MalformedInput(format!(
                "start_time {} must be before end_time {}",
                start, end
            )));
        }
        Ok(Self {
            coach_id,
            weekday,
            start,
            end,
        })
    }
}

/// A confirmed reservation of one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub coach_id: CoachId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Booking fields handed to storage for the atomic insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_id: UserId,
    pub coach_id: CoachId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl NewBooking {
    /// A booking of the single slot starting at `start`.
    pub fn for_slot(user_id: UserId, coach_id: CoachId, start: DateTime<Utc>) -> Self {
        Self {
            user_id,
            coach_id,
            start,
            end: start + slot_duration(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_timezone;
    use chrono::TimeZone;

    #[test]
    fn test_new_availability_rejects_inverted_window() {
        let coach = CoachId::new(1);
        let day = Weekday::new(2).unwrap();
        let nine = LocalTime::parse("09:00").unwrap();
        let noon = LocalTime::parse("12:00").unwrap();

        assert!(NewAvailabilityWindow::new(coach, day, nine, noon).is_ok());
        assert!(matches!(
            NewAvailabilityWindow::new(coach, day, noon, nine),
            Err(BookingError::MalformedInput(_))
        ));
        assert!(NewAvailabilityWindow::new(coach, day, nine, nine).is_err());
    }

    #[test]
    fn test_anchor_window() {
        let window = AvailabilityWindow {
            id: AvailabilityId::new(1),
            coach_id: CoachId::new(1),
            weekday: Weekday::new(2).unwrap(),
            start: LocalTime::parse("09:00").unwrap(),
            end: LocalTime::parse("12:00").unwrap(),
            created_at: Utc::now(),
        };
        let tz = parse_timezone("Asia/Kolkata").unwrap();
        let (start, end) = window
            .anchor(NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(), tz)
            .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 7, 3, 30, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 7, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_new_booking_spans_one_slot() {
        let start = Utc.with_ymd_and_hms(2025, 1, 7, 3, 30, 0).unwrap();
        let booking = NewBooking::for_slot(UserId::new(7), CoachId::new(1), start);
        assert_eq!(booking.end - booking.start, chrono::Duration::minutes(30));
    }

    #[test]
    fn test_ids_parse_and_serialize_transparently() {
        let id: CoachId = "42".parse().unwrap();
        assert_eq!(id, CoachId::new(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert!("abc".parse::<BookingId>().is_err());
    }
}
