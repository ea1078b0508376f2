use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;

use super::schema::{bookings, coach_availabilities, coaches};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    AvailabilityId, AvailabilityWindow, Booking, BookingId, Coach, CoachId, LocalTime,
    NewAvailabilityWindow, NewBooking, NewCoach, UserId, Weekday,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coaches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CoachRow {
    pub coach_id: i64,
    pub name: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = coaches)]
pub struct NewCoachRow {
    pub name: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coach_availabilities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AvailabilityRow {
    pub availability_id: i64,
    pub coach_id: i64,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = coach_availabilities)]
pub struct NewAvailabilityRow {
    pub coach_id: i64,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookingRow {
    pub booking_id: i64,
    pub user_id: i64,
    pub coach_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBookingRow {
    pub user_id: i64,
    pub coach_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&NewCoach> for NewCoachRow {
    fn from(coach: &NewCoach) -> Self {
        Self {
            name: coach.name.clone(),
            timezone: coach.timezone.clone(),
        }
    }
}

impl From<CoachRow> for Coach {
    fn from(row: CoachRow) -> Self {
        Self {
            id: CoachId::new(row.coach_id),
            name: row.name,
            timezone: row.timezone,
            created_at: row.created_at,
        }
    }
}

impl From<&NewAvailabilityWindow> for NewAvailabilityRow {
    fn from(window: &NewAvailabilityWindow) -> Self {
        Self {
            coach_id: window.coach_id.value(),
            day_of_week: i16::from(window.weekday.number()),
            start_time: window.start.as_naive(),
            end_time: window.end.as_naive(),
        }
    }
}

impl TryFrom<AvailabilityRow> for AvailabilityWindow {
    type Error = RepositoryError;

    fn try_from(row: AvailabilityRow) -> RepositoryResult<Self> {
        let weekday = Weekday::new(i64::from(row.day_of_week)).map_err(|e| {
            RepositoryError::validation(format!(
                "availability {} has invalid day_of_week: {}",
                row.availability_id, e
            ))
        })?;
        Ok(Self {
            id: AvailabilityId::new(row.availability_id),
            coach_id: CoachId::new(row.coach_id),
            weekday,
            start: LocalTime::from_naive(row.start_time),
            end: LocalTime::from_naive(row.end_time),
            created_at: row.created_at,
        })
    }
}

impl From<&NewBooking> for NewBookingRow {
    fn from(booking: &NewBooking) -> Self {
        Self {
            user_id: booking.user_id.value(),
            coach_id: booking.coach_id.value(),
            start_time: booking.start,
            end_time: booking.end,
        }
    }
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: BookingId::new(row.booking_id),
            user_id: UserId::new(row.user_id),
            coach_id: CoachId::new(row.coach_id),
            start: row.start_time,
            end: row.end_time,
            created_at: row.created_at,
        }
    }
}
