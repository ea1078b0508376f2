//! Conversions between coach-local wall-clock time and UTC instants.
//!
//! Availability is declared as recurring local times ("09:00" to "12:00" every
//! Tuesday) in the coach's IANA timezone, while slots and bookings live on the
//! UTC timeline. Everything here is pure: the zone rules used are the ones in
//! effect on the calendar date being converted, never the rules of "now".
//!
//! # DST resolution
//!
//! - A wall-clock time that occurs twice (fall-back overlap) resolves to the
//!   earlier instant.
//! - A wall-clock time that never occurs (spring-forward gap) is read with the
//!   offset in effect before the transition, which lands it after the gap:
//!   02:30 on a US spring-forward date becomes 03:30 daylight time.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    SecondsFormat, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BookingError, BookingResult};

/// Length of every bookable slot, in minutes.
pub const SLOT_MINUTES: i64 = 30;

/// Fixed slot length as a duration.
pub fn slot_duration() -> Duration {
    Duration::minutes(SLOT_MINUTES)
}

/// A local wall-clock time of day with minute precision (`"HH:MM"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalTime {
    hour: u8,
    minute: u8,
}

impl LocalTime {
    pub const MIDNIGHT: LocalTime = LocalTime { hour: 0, minute: 0 };

    pub fn new(hour: u32, minute: u32) -> BookingResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(BookingError::MalformedInput(format!(
                "local time {:02}:{:02} is out of range",
                hour, minute
            )));
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Parse a strict two-digit `"HH:MM"` 24-hour time.
    pub fn parse(value: &str) -> BookingResult<Self> {
        let malformed = || BookingError::MalformedInput(format!("'{}' must be HH:MM", value));

        let bytes = value.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(malformed());
        }
        let time = NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| malformed())?;
        Self::new(time.hour(), time.minute())
    }

    /// Build from a `NaiveTime`, dropping seconds.
    pub fn from_naive(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.hour)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minute)
    }

    pub fn as_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or_default()
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for LocalTime {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for LocalTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocalTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Day of the week, numbered 0 (Sunday) through 6 (Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Weekday(u8);

impl Weekday {
    pub fn new(day: i64) -> BookingResult<Self> {
        if !(0..=6).contains(&day) {
            return Err(BookingError::MalformedInput(format!(
                "day must be 0..6, got {}",
                day
            )));
        }
        Ok(Self(day as u8))
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        Self(day.num_days_from_sunday() as u8)
    }

    pub fn number(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Weekday {
    type Error = BookingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Weekday> for i64 {
    fn from(day: Weekday) -> Self {
        i64::from(day.0)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolve an IANA timezone identifier such as `"Asia/Kolkata"`.
pub fn parse_timezone(name: &str) -> BookingResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| BookingError::InvalidTimezone(name.to_string()))
}

/// The UTC instant of `time` on `date` as observed in `tz`.
pub fn local_to_utc(date: NaiveDate, time: LocalTime, tz: Tz) -> BookingResult<DateTime<Utc>> {
    let naive = date.and_time(time.as_naive());
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => resolve_gap(naive, tz),
    }
}

fn resolve_gap(naive: NaiveDateTime, tz: Tz) -> BookingResult<DateTime<Utc>> {
    let offset = tz
        .offset_from_local_datetime(&(naive - Duration::days(1)))
        .earliest()
        .ok_or_else(|| {
            BookingError::MalformedInput(format!(
                "local time {} does not exist in {}",
                naive,
                tz.name()
            ))
        })?;
    let utc = naive - Duration::seconds(i64::from(offset.fix().local_minus_utc()));
    Ok(Utc.from_utc_datetime(&utc))
}

/// The weekday of a calendar date as observed in `tz`.
pub fn weekday_of(date: NaiveDate, tz: Tz) -> BookingResult<Weekday> {
    let midnight = local_to_utc(date, LocalTime::MIDNIGHT, tz)?;
    Ok(Weekday::from_chrono(midnight.with_timezone(&tz).weekday()))
}

/// Half-open UTC bounds of a local calendar day, from its local midnight to
/// the next one. The span is 23 or 25 hours on DST transition dates.
pub fn local_day_bounds(date: NaiveDate, tz: Tz) -> BookingResult<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date
        .succ_opt()
        .ok_or_else(|| BookingError::MalformedInput(format!("date {} is out of range", date)))?;
    let start = local_to_utc(date, LocalTime::MIDNIGHT, tz)?;
    let end = local_to_utc(next, LocalTime::MIDNIGHT, tz)?;
    Ok((start, end))
}

/// Whether `instant` sits on a UTC :00 or :30 mark with no seconds.
pub fn is_slot_aligned(instant: DateTime<Utc>) -> bool {
    i64::from(instant.minute()) % SLOT_MINUTES == 0
        && instant.second() == 0
        && instant.nanosecond() == 0
}

/// Parse an RFC 3339 timestamp carrying an explicit offset.
pub fn parse_instant(value: &str) -> BookingResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            BookingError::MalformedInput(format!(
                "datetime '{}' must be RFC3339 with timezone",
                value
            ))
        })
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_local_date(value: &str) -> BookingResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| BookingError::MalformedInput(format!("date '{}' must be YYYY-MM-DD", value)))
}

/// Canonical representation of an instant: RFC 3339, whole seconds, `Z` suffix.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;
