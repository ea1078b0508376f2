//! Weekly recurring availability of coaches.

use chrono_tz::Tz;
use log::{debug, info};

use crate::db::repository::{AvailabilityRepository, CoachRepository, RepositoryError};
use crate::error::{BookingError, BookingResult};
use crate::models::{
    parse_timezone, AvailabilityWindow, CoachId, LocalTime, NewAvailabilityWindow, Weekday,
};

/// Map a failed coach lookup: a missing row is `CoachNotFound`, anything else
/// is a storage failure.
pub(crate) fn coach_lookup_error(coach_id: CoachId, err: RepositoryError) -> BookingError {
    if err.is_not_found() {
        BookingError::CoachNotFound(coach_id)
    } else {
        BookingError::StorageError(err)
    }
}

/// Resolve the timezone a coach's availability is expressed in.
pub async fn coach_timezone<R>(repo: &R, coach_id: CoachId) -> BookingResult<Tz>
where
    R: CoachRepository + ?Sized,
{
    let name = repo
        .lookup_coach_timezone(coach_id)
        .await
        .map_err(|e| coach_lookup_error(coach_id, e))?;
    parse_timezone(&name)
}

/// All windows of `coach_id` on `weekday`, in creation order.
pub async fn windows_for<R>(
    repo: &R,
    coach_id: CoachId,
    weekday: Weekday,
) -> BookingResult<Vec<AvailabilityWindow>>
where
    R: AvailabilityRepository + ?Sized,
{
    let windows = repo.windows_for(coach_id, weekday).await?;
    debug!(
        "coach {} has {} availability window(s) on weekday {}",
        coach_id,
        windows.len(),
        weekday
    );
    Ok(windows)
}

/// Declare a new recurring window.
///
/// Input is checked in this order: weekday range, `HH:MM` format of both
/// times, `start < end`, then coach existence. Overlapping windows are stored
/// as-is.
pub async fn add_window<R>(
    repo: &R,
    coach_id: CoachId,
    day: i64,
    start: &str,
    end: &str,
) -> BookingResult<AvailabilityWindow>
where
    R: CoachRepository + AvailabilityRepository + ?Sized,
{
    let weekday = Weekday::new(day)?;
    let start = LocalTime::parse(start)?;
    let end = LocalTime::parse(end)?;
    let window = NewAvailabilityWindow::new(coach_id, weekday, start, end)?;

    repo.get_coach(coach_id)
        .await
        .map_err(|e| coach_lookup_error(coach_id, e))?;

    let stored = repo.insert_availability(&window).await?;
    info!(
        "availability {} added for coach {}: weekday {} {}-{}",
        stored.id, coach_id, weekday, start, end
    );
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::error::ErrorKind;
    use crate::models::NewCoach;

    async fn repo_with_coach() -> (LocalRepository, CoachId) {
        let repo = LocalRepository::new();
        let coach = repo
            .insert_coach(&NewCoach {
                name: "Asha".to_string(),
                timezone: "Asia/Kolkata".to_string(),
            })
            .await
            .unwrap();
        (repo, coach.id)
    }

    #[tokio::test]
    async fn test_add_window_and_list() {
        let (repo, coach) = repo_with_coach().await;
        let window = add_window(&repo, coach, 2, "09:00", "12:00").await.unwrap();
        assert_eq!(window.start.to_string(), "09:00");

        let listed = windows_for(&repo, coach, Weekday::new(2).unwrap())
            .await
            .unwrap();
        assert_eq!(listed, vec![window]);
        assert!(windows_for(&repo, coach, Weekday::new(3).unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_add_window_rejections() {
        let (repo, coach) = repo_with_coach().await;

        let cases = [
            (coach, 7, "09:00", "12:00", ErrorKind::MalformedInput),
            (coach, 2, "9:00", "12:00", ErrorKind::MalformedInput),
            (coach, 2, "09:00", "12-00", ErrorKind::MalformedInput),
            (coach, 2, "12:00", "09:00", ErrorKind::MalformedInput),
            (coach, 2, "09:00", "09:00", ErrorKind::MalformedInput),
            (CoachId::new(404), 2, "09:00", "12:00", ErrorKind::CoachNotFound),
        ];
        for (coach_id, day, start, end, expected) in cases {
            let err = add_window(&repo, coach_id, day, start, end)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), expected, "{day} {start}-{end}");
        }
        assert!(windows_for(&repo, coach, Weekday::new(2).unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_coach_timezone() {
        let (repo, coach) = repo_with_coach().await;
        assert_eq!(coach_timezone(&repo, coach).await.unwrap(), chrono_tz::Asia::Kolkata);

        let err = coach_timezone(&repo, CoachId::new(99)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CoachNotFound);

        repo.set_healthy(false);
        let err = coach_timezone(&repo, coach).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageError);
    }
}
