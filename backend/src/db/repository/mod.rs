//! Repository trait definitions for storage operations.
//!
//! Storage is consumed through a few focused traits so that a backend only has
//! to provide plain reads, plain inserts and one atomic, uniqueness-guarded
//! booking insert:
//!
//! - [`error`]: Error types for repository operations
//! - [`coach`]: Coach records and their timezones
//! - [`availability`]: Recurring weekly availability windows
//! - [`booking`]: The booking ledger rows
//!
//! # Trait Composition
//!
//! ```ignore
//! impl CoachRepository for MyRepo { ... }
//! impl AvailabilityRepository for MyRepo { ... }
//! impl BookingRepository for MyRepo { ... }
//! ```
//!
//! Services take `&dyn FullRepository` (or `Arc<dyn FullRepository>`) so the
//! in-memory and Postgres backends are interchangeable.

pub mod availability;
pub mod booking;
pub mod coach;
pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use availability::AvailabilityRepository;
pub use booking::BookingRepository;
pub use coach::CoachRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Implemented automatically for any type that implements all three
/// repository traits.
pub trait FullRepository: CoachRepository + AvailabilityRepository + BookingRepository {}

impl<T> FullRepository for T where T: CoachRepository + AvailabilityRepository + BookingRepository {}
