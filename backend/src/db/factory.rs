//! Repository selection at startup.
//!
//! The backend is chosen from, in order of precedence: an explicit
//! [`RepositoryType`], a `booking.toml` file, or the environment.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use super::PostgresConfig;

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Accepts `"postgres"`, `"pg"` or `"local"`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Read `REPOSITORY_TYPE`; without it, Postgres is chosen when a database
    /// URL is present and Local otherwise.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or_else(|e| {
                log::warn!("{}; falling back to local repository", e);
                Self::Local
            });
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Self::Postgres
        } else {
            Self::Local
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use coach_booking::db::{RepositoryFactory, RepositoryType};
///
/// let repo = RepositoryFactory::create(RepositoryType::Local, None).await?;
/// assert!(repo.health_check().await?);
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository of the given type.
    ///
    /// `postgres_config` is required for [`RepositoryType::Postgres`].
    pub async fn create(
        repo_type: RepositoryType,
        postgres_config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Postgres => {
                let config = postgres_config.ok_or_else(|| {
                    RepositoryError::configuration("Postgres repository requires PostgresConfig")
                })?;
                Self::postgres_as_full(config).await
            }
        }
    }

    /// Create a Postgres repository, running pending migrations.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let config = config.clone();
        // Pool construction and migrations block on network I/O.
        let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
            .await
            .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))??;

        let (healthy, latency_ms, error) = repo.health_check_detailed().await;
        if !healthy {
            return Err(RepositoryError::connection(format!(
                "Postgres health check failed after {}ms: {}",
                latency_ms,
                error.unwrap_or_default()
            )));
        }
        log::info!(
            "Postgres health check ok in {}ms, pool: {:?}",
            latency_ms,
            repo.get_pool_stats()
        );
        Ok(Arc::new(repo))
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        log::info!("Using in-memory local repository");
        Arc::new(LocalRepository::new())
    }

    /// Create a repository from `REPOSITORY_TYPE` / `DATABASE_URL` and the
    /// `PG_*` variables.
    pub async fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        match RepositoryType::from_env() {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Postgres => {
                let config = PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
                Self::postgres_as_full(&config).await
            }
        }
    }

    /// Create a repository from a TOML configuration file.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config).await
    }

    /// Create a repository from `booking.toml` in one of the standard locations.
    pub async fn from_default_config() -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_default_location()?;
        Self::from_repository_config(&config).await
    }

    async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match config.repository_type()? {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Postgres => {
                let pg_config = config.to_postgres_config()?.ok_or_else(|| {
                    RepositoryError::configuration(
                        "Postgres repository requires database configuration",
                    )
                })?;
                Self::postgres_as_full(&pg_config).await
            }
        }
    }

    #[cfg(feature = "postgres-repo")]
    async fn postgres_as_full(config: &PostgresConfig) -> RepositoryResult<Arc<dyn FullRepository>> {
        let pg = Self::create_postgres(config).await?;
        Ok(pg as Arc<dyn FullRepository>)
    }

    #[cfg(not(feature = "postgres-repo"))]
    async fn postgres_as_full(_config: &PostgresConfig) -> RepositoryResult<Arc<dyn FullRepository>> {
        Err(RepositoryError::configuration(
            "Postgres repository feature not enabled",
        ))
    }
}
