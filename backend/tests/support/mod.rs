#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use coach_booking::db::repositories::LocalRepository;
use coach_booking::models::{AvailabilityWindow, CoachId};
use coach_booking::services;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process-global environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// A coach with the given timezone and no availability.
pub async fn seed_coach(repo: &LocalRepository, timezone: &str) -> CoachId {
    services::create_coach(repo, "Test Coach", timezone)
        .await
        .expect("coach should be created")
        .id
}

/// Add a window; panics on validation failure.
pub async fn seed_window(
    repo: &LocalRepository,
    coach_id: CoachId,
    day: i64,
    start: &str,
    end: &str,
) -> AvailabilityWindow {
    services::add_availability(repo, coach_id, day, start, end)
        .await
        .expect("window should be accepted")
}

/// The Kolkata coach used across tests: Tuesday 09:00-12:00.
pub async fn kolkata_tuesday_coach(repo: &LocalRepository) -> CoachId {
    let coach = seed_coach(repo, "Asia/Kolkata").await;
    seed_window(repo, coach, 2, "09:00", "12:00").await;
    coach
}
