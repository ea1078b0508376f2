//! Postgres repository implementation using Diesel.
//!
//! Three tables back the booking core: `coaches`, `coach_availabilities` and
//! `bookings`. The `bookings_coach_start_key` unique constraint on
//! `(coach_id, start_time)` is what makes double booking impossible; an insert
//! that loses the race surfaces as [`RepositoryError::ConflictError`].
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

use crate::db::repository::{
    AvailabilityRepository, BookingRepository, CoachRepository, ErrorContext, RepositoryError,
    RepositoryResult,
};
use crate::models::{
    AvailabilityWindow, Booking, BookingId, Coach, CoachId, NewAvailabilityWindow, NewBooking,
    NewCoach, UserId, Weekday,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of idle connections kept in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// Unparsable numeric values fall back to their defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub max_size: u32,
    /// Statements executed, successful or not
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

/// Which failures [`PostgresRepository::with_conn`] may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryScope {
    /// Pool checkout failures and retryable statement errors.
    Transient,
    /// Pool checkout failures only; the statement itself runs at most once.
    Checkout,
}

impl RetryScope {
    fn allows(self, at_checkout: bool, err: &RepositoryError) -> bool {
        match self {
            Self::Transient => err.is_retryable(),
            Self::Checkout => at_checkout && err.is_retryable(),
        }
    }
}

#[derive(Debug, Default)]
struct QueryCounters {
    total: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    counters: Arc<QueryCounters>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        log::info!(
            "Postgres repository ready (max_pool_size={}, max_retries={})",
            config.max_pool_size,
            config.max_retries
        );

        Ok(Self {
            pool,
            config,
            counters: Arc::new(QueryCounters::default()),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        Ok(())
    }

    /// Run `f` on a pooled connection inside a blocking task.
    ///
    /// Retryable failures (pool checkout, serialization failures) are retried
    /// with exponential backoff. Conflicts and not-found are returned at once.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: Fn(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        self.with_conn_scoped(operation, RetryScope::Transient, f).await
    }

    /// Like [`Self::with_conn`], retrying only according to `scope`.
    async fn with_conn_scoped<T, F>(
        &self,
        operation: &'static str,
        scope: RetryScope,
        f: F,
    ) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: Fn(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);
        let counters = self.counters.clone();

        task::spawn_blocking(move || {
            let mut attempt = 0;
            loop {
                let result = match pool.get() {
                    Ok(mut conn) => {
                        counters.total.fetch_add(1, Ordering::Relaxed);
                        f(&mut conn).map_err(|e| (false, e))
                    }
                    Err(e) => Err((
                        true,
                        RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new(operation)
                                .with_details(format!("attempt={}", attempt + 1)),
                        ),
                    )),
                };

                match result {
                    Ok(value) => return Ok(value),
                    Err((at_checkout, e))
                        if attempt < max_retries && scope.allows(at_checkout, &e) =>
                    {
                        log::warn!("{} failed (attempt {}), retrying: {}", operation, attempt + 1, e);
                        counters.retried.fetch_add(1, Ordering::Relaxed);
                        std::thread::sleep(delay);
                        delay *= 2;
                        attempt += 1;
                    }
                    Err((_, e)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                }
            }
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.counters.total.load(Ordering::Relaxed),
            failed_queries: self.counters.failed.load(Ordering::Relaxed),
            retried_operations: self.counters.retried.load(Ordering::Relaxed),
        }
    }

    /// Returns `(is_healthy, latency_ms, error_message)`.
    pub async fn health_check_detailed(&self) -> (bool, u64, Option<String>) {
        let start = Instant::now();
        let outcome = self.health_check().await;
        let latency = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(true) => (true, latency, None),
            Ok(false) => (false, latency, Some("Health check returned false".to_string())),
            Err(e) => (false, latency, Some(e.to_string())),
        }
    }
}

#[async_trait]
impl CoachRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1").execute(conn)?;
            Ok(true)
        })
        .await
    }

    async fn insert_coach(&self, coach: &NewCoach) -> RepositoryResult<Coach> {
        let row = NewCoachRow::from(coach);
        self.with_conn("insert_coach", move |conn| {
            let inserted: CoachRow = diesel::insert_into(coaches::table)
                .values(&row)
                .returning(CoachRow::as_returning())
                .get_result(conn)?;
            Ok(inserted.into())
        })
        .await
    }

    async fn get_coach(&self, coach_id: CoachId) -> RepositoryResult<Coach> {
        self.with_conn("get_coach", move |conn| {
            coaches::table
                .find(coach_id.value())
                .select(CoachRow::as_select())
                .first::<CoachRow>(conn)
                .optional()?
                .map(Coach::from)
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("Coach {} not found", coach_id),
                        ErrorContext::new("get_coach")
                            .with_entity("coach")
                            .with_entity_id(coach_id),
                    )
                })
        })
        .await
    }

    async fn lookup_coach_timezone(&self, coach_id: CoachId) -> RepositoryResult<String> {
        self.with_conn("lookup_coach_timezone", move |conn| {
            coaches::table
                .find(coach_id.value())
                .select(coaches::timezone)
                .first::<String>(conn)
                .optional()?
                .ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("Coach {} not found", coach_id),
                        ErrorContext::new("lookup_coach_timezone")
                            .with_entity("coach")
                            .with_entity_id(coach_id),
                    )
                })
        })
        .await
    }
}

#[async_trait]
impl AvailabilityRepository for PostgresRepository {
    async fn insert_availability(
        &self,
        window: &NewAvailabilityWindow,
    ) -> RepositoryResult<AvailabilityWindow> {
        let row = NewAvailabilityRow::from(window);
        self.with_conn("insert_availability", move |conn| {
            let inserted: AvailabilityRow = diesel::insert_into(coach_availabilities::table)
                .values(&row)
                .returning(AvailabilityRow::as_returning())
                .get_result(conn)?;
            AvailabilityWindow::try_from(inserted)
        })
        .await
    }

    async fn windows_for(
        &self,
        coach_id: CoachId,
        weekday: Weekday,
    ) -> RepositoryResult<Vec<AvailabilityWindow>> {
        self.with_conn("windows_for", move |conn| {
            let rows: Vec<AvailabilityRow> = coach_availabilities::table
                .filter(coach_availabilities::coach_id.eq(coach_id.value()))
                .filter(coach_availabilities::day_of_week.eq(i16::from(weekday.number())))
                .order(coach_availabilities::availability_id.asc())
                .select(AvailabilityRow::as_select())
                .load(conn)?;
            rows.into_iter().map(AvailabilityWindow::try_from).collect()
        })
        .await
    }
}

#[async_trait]
impl BookingRepository for PostgresRepository {
    async fn bookings_in_range(
        &self,
        coach_id: CoachId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<DateTime<Utc>>> {
        self.with_conn("bookings_in_range", move |conn| {
            let starts = bookings::table
                .filter(bookings::coach_id.eq(coach_id.value()))
                .filter(bookings::start_time.ge(start))
                .filter(bookings::start_time.lt(end))
                .select(bookings::start_time)
                .load::<DateTime<Utc>>(conn)?;
            Ok(starts)
        })
        .await
    }

    async fn insert_booking_atomic(&self, booking: &NewBooking) -> RepositoryResult<Booking> {
        let row = NewBookingRow::from(booking);
        // A failed insert is surfaced as-is; only acquiring the connection is retried.
        self.with_conn_scoped("insert_booking_atomic", RetryScope::Checkout, move |conn| {
            conn.transaction(|tx| {
                let inserted: BookingRow = diesel::insert_into(bookings::table)
                    .values(&row)
                    .returning(BookingRow::as_returning())
                    .get_result(tx)?;
                Ok(Booking::from(inserted))
            })
        })
        .await
    }

    async fn delete_booking(&self, booking_id: BookingId) -> RepositoryResult<usize> {
        self.with_conn("delete_booking", move |conn| {
            let affected =
                diesel::delete(bookings::table.find(booking_id.value())).execute(conn)?;
            Ok(affected)
        })
        .await
    }

    async fn bookings_for_user(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Booking>> {
        self.with_conn("bookings_for_user", move |conn| {
            let rows: Vec<BookingRow> = bookings::table
                .filter(bookings::user_id.eq(user_id.value()))
                .filter(bookings::start_time.ge(from))
                .order((bookings::start_time.asc(), bookings::booking_id.asc()))
                .select(BookingRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Booking::from).collect())
        })
        .await
    }
}
