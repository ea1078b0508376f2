//! Recurring availability windows.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{AvailabilityWindow, CoachId, NewAvailabilityWindow, Weekday};

/// Repository trait for coach availability windows.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Store a window as-is. Overlapping windows are kept separately.
    async fn insert_availability(
        &self,
        window: &NewAvailabilityWindow,
    ) -> RepositoryResult<AvailabilityWindow>;

    /// All windows of a coach on a weekday, in creation (id) order.
    async fn windows_for(
        &self,
        coach_id: CoachId,
        weekday: Weekday,
    ) -> RepositoryResult<Vec<AvailabilityWindow>>;
}
