//! Coach records.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Coach, CoachId, NewCoach};

/// Repository trait for coach records and connectivity.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CoachRepository: Send + Sync {
    /// Check if the storage backend is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store a coach. The timezone must already have been validated.
    async fn insert_coach(&self, coach: &NewCoach) -> RepositoryResult<Coach>;

    /// Fetch a coach by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the coach doesn't exist
    async fn get_coach(&self, coach_id: CoachId) -> RepositoryResult<Coach>;

    /// The IANA timezone identifier stored for a coach.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the coach doesn't exist
    async fn lookup_coach_timezone(&self, coach_id: CoachId) -> RepositoryResult<String>;
}
