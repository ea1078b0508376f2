//! Candidate slot enumeration.
//!
//! Each availability window is anchored onto the requested local date once,
//! then walked forward in absolute 30-minute steps on the UTC timeline. A slot
//! is emitted only while `slot + 30min <= window_end`, so a trailing partial
//! remainder is dropped. Windows are independent: overlapping windows yield
//! duplicate instants and nothing is merged.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use log::debug;

use super::availability::{coach_timezone, windows_for};
use super::ledger;
use crate::db::repository::{AvailabilityRepository, FullRepository};
use crate::error::BookingResult;
use crate::models::{local_day_bounds, slot_duration, weekday_of, AvailabilityWindow, CoachId};

/// Lazy, restartable iterator over slot start instants.
///
/// Order is window order, then chronological within a window. Cloning the
/// iterator before consuming it replays the same sequence.
#[derive(Debug, Clone, Default)]
pub struct SlotIter {
    spans: Vec<(DateTime<Utc>, DateTime<Utc>)>,
    index: usize,
    cursor: Option<DateTime<Utc>>,
}

impl SlotIter {
    /// Anchor `windows` onto `date` in `tz`.
    pub fn from_windows(
        windows: &[AvailabilityWindow],
        date: NaiveDate,
        tz: Tz,
    ) -> BookingResult<Self> {
        let spans = windows
            .iter()
            .map(|w| w.anchor(date, tz))
            .collect::<BookingResult<Vec<_>>>()?;
        Ok(Self {
            spans,
            index: 0,
            cursor: None,
        })
    }
}

impl Iterator for SlotIter {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(start, end)) = self.spans.get(self.index) {
            let candidate = self.cursor.unwrap_or(start);
            let slot_end = candidate + slot_duration();
            if slot_end <= end {
                self.cursor = Some(slot_end);
                return Some(candidate);
            }
            self.index += 1;
            self.cursor = None;
        }
        None
    }
}

/// Candidate slots of `coach_id` on the local calendar date `date` in `tz`.
pub async fn generate_slots<R>(
    repo: &R,
    coach_id: CoachId,
    date: NaiveDate,
    tz: Tz,
) -> BookingResult<SlotIter>
where
    R: AvailabilityRepository + ?Sized,
{
    let weekday = weekday_of(date, tz)?;
    let windows = windows_for(repo, coach_id, weekday).await?;
    SlotIter::from_windows(&windows, date, tz)
}

/// Unbooked slots for a coach on a local date, with the coach's timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableSlots {
    pub timezone: Tz,
    pub slots: Vec<DateTime<Utc>>,
}

/// Generate slots for the coach's local `date` and drop those already booked.
pub async fn available_slots<R>(
    repo: &R,
    coach_id: CoachId,
    date: NaiveDate,
) -> BookingResult<AvailableSlots>
where
    R: FullRepository + ?Sized,
{
    let tz = coach_timezone(repo, coach_id).await?;
    let candidates = generate_slots(repo, coach_id, date, tz).await?;
    let (day_start, day_end) = local_day_bounds(date, tz)?;
    let booked: HashSet<DateTime<Utc>> =
        ledger::bookings_in_range(repo, coach_id, day_start, day_end).await?;

    let slots: Vec<_> = candidates.filter(|s| !booked.contains(s)).collect();
    debug!(
        "coach {} on {} ({}): {} open slot(s), {} booked",
        coach_id,
        date,
        tz.name(),
        slots.len(),
        booked.len()
    );
    Ok(AvailableSlots {
        timezone: tz,
        slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_timezone, AvailabilityId, LocalTime, Weekday};
    use chrono::TimeZone;

    fn window(id: i64, start: &str, end: &str) -> AvailabilityWindow {
        AvailabilityWindow {
            id: AvailabilityId::new(id),
            coach_id: CoachId::new(1),
            weekday: Weekday::new(2).unwrap(),
            start: LocalTime::parse(start).unwrap(),
            end: LocalTime::parse(end).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 7, h, m, 0).unwrap()
    }

    #[test]
    fn test_kolkata_morning_window() {
        let tz = parse_timezone("Asia/Kolkata").unwrap();
        let slots: Vec<_> = SlotIter::from_windows(&[window(1, "09:00", "12:00")], tuesday(), tz)
            .unwrap()
            .collect();
        assert_eq!(
            slots,
            vec![
                utc(3, 30),
                utc(4, 0),
                utc(4, 30),
                utc(5, 0),
                utc(5, 30),
                utc(6, 0)
            ]
        );
    }

    #[test]
    fn test_partial_remainder_is_dropped() {
        let tz = parse_timezone("UTC").unwrap();
        let slots: Vec<_> = SlotIter::from_windows(&[window(1, "09:00", "10:45")], tuesday(), tz)
            .unwrap()
            .collect();
        assert_eq!(slots, vec![utc(9, 0), utc(9, 30), utc(10, 0)]);
    }

    #[test]
    fn test_window_shorter_than_slot_is_empty() {
        let tz = parse_timezone("UTC").unwrap();
        let mut iter =
            SlotIter::from_windows(&[window(1, "09:00", "09:20")], tuesday(), tz).unwrap();
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_overlapping_windows_are_not_deduplicated() {
        let tz = parse_timezone("UTC").unwrap();
        let windows = [window(1, "09:00", "10:00"), window(2, "09:30", "10:30")];
        let slots: Vec<_> = SlotIter::from_windows(&windows, tuesday(), tz)
            .unwrap()
            .collect();
        assert_eq!(slots, vec![utc(9, 0), utc(9, 30), utc(9, 30), utc(10, 0)]);
    }

    #[test]
    fn test_clone_restarts_sequence() {
        let tz = parse_timezone("Europe/Berlin").unwrap();
        let iter = SlotIter::from_windows(&[window(1, "08:00", "10:00")], tuesday(), tz).unwrap();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_spring_forward_walks_absolute_time() {
        // 2025-03-09, New York: 02:00-03:00 local does not exist.
        let tz = parse_timezone("America/New_York").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let mut sunday = window(1, "01:00", "04:00");
        sunday.weekday = Weekday::new(0).unwrap();
        let slots: Vec<_> = SlotIter::from_windows(&[sunday], date, tz)
            .unwrap()
            .collect();

        // 01:00 EST is 06:00Z and 04:00 EDT is 08:00Z: two real hours.
        let at = |h, m| Utc.with_ymd_and_hms(2025, 3, 9, h, m, 0).unwrap();
        assert_eq!(slots, vec![at(6, 0), at(6, 30), at(7, 0), at(7, 30)]);
    }

    #[test]
    fn test_fall_back_covers_repeated_hour() {
        // 2025-11-02, New York: 01:00-02:00 local happens twice.
        let tz = parse_timezone("America/New_York").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
        let mut sunday = window(1, "01:00", "02:00");
        sunday.weekday = Weekday::new(0).unwrap();
        let slots: Vec<_> = SlotIter::from_windows(&[sunday], date, tz)
            .unwrap()
            .collect();

        // 01:00 resolves to the first (EDT) occurrence, 05:00Z; 02:00 EST is 07:00Z.
        let at = |h, m| Utc.with_ymd_and_hms(2025, 11, 2, h, m, 0).unwrap();
        assert_eq!(slots, vec![at(5, 0), at(5, 30), at(6, 0), at(6, 30)]);
    }

    #[tokio::test]
    async fn test_booked_slot_in_last_hour_of_long_day_is_excluded() {
        use crate::db::repositories::LocalRepository;
        use crate::db::repository::{AvailabilityRepository, BookingRepository, CoachRepository};
        use crate::models::{NewAvailabilityWindow, NewBooking, NewCoach, UserId};

        let repo = LocalRepository::new();
        let coach = repo
            .insert_coach(&NewCoach {
                name: "Dana".to_string(),
                timezone: "America/New_York".to_string(),
            })
            .await
            .unwrap();
        let late = NewAvailabilityWindow::new(
            coach.id,
            Weekday::new(0).unwrap(),
            LocalTime::parse("23:00").unwrap(),
            LocalTime::parse("23:30").unwrap(),
        )
        .unwrap();
        repo.insert_availability(&late).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
        let slot = Utc.with_ymd_and_hms(2025, 11, 3, 4, 0, 0).unwrap();
        let open = available_slots(&repo, coach.id, date).await.unwrap();
        assert_eq!(open.slots, vec![slot]);

        repo.insert_booking_atomic(&NewBooking::for_slot(UserId::new(1), coach.id, slot))
            .await
            .unwrap();
        let open = available_slots(&repo, coach.id, date).await.unwrap();
        assert!(open.slots.is_empty());
    }
}
