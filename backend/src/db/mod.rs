//! Persistence layer for coaches, availability windows and bookings.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers (axum)                                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  services: catalog, slot generator, ledger, validator   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  repository traits (Coach / Availability / Booking)     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!        ┌────────────┴─────────────┐
//!        │                          │
//!   LocalRepository          PostgresRepository
//!   (in-memory)              (Diesel + r2d2)
//! ```
//!
//! Use [`RepositoryFactory`] to obtain an `Arc<dyn FullRepository>`.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
impl PostgresConfig {
    pub fn from_env() -> Result<Self, String> {
        Err("Postgres repository feature not enabled".to_string())
    }
}

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AvailabilityRepository, BookingRepository, CoachRepository, ErrorContext, FullRepository,
    RepositoryError, RepositoryResult,
};
