//! Error taxonomy for coach, availability and booking operations.
//!
//! Every variant carries a human-readable reason. Validation failures are
//! raised before any mutating storage call; [`BookingError::SlotConflict`] and
//! [`BookingError::StorageError`] are surfaced as-is and never retried here.

use std::fmt;

use crate::db::repository::RepositoryError;
use crate::models::{BookingId, CoachId};

/// Result type for booking operations.
pub type BookingResult<T> = Result<T, BookingError>;

/// Failure outcomes of the booking core.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Unparsable timestamp, weekday out of range, bad `HH:MM`, inverted window.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Timezone identifier not present in the IANA database.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Coach {0} not found")]
    CoachNotFound(CoachId),

    /// Requested start is not on a UTC :00 or :30 mark.
    #[error("Slot must be on 30-minute boundary (minute 00 or 30): {0}")]
    BoundaryViolation(String),

    #[error("Requested slot {0} is not within coach availability for that local date")]
    OutsideAvailability(String),

    /// Another booking already holds this (coach, start) pair.
    #[error("Slot {start} already booked for coach {coach_id}")]
    SlotConflict { coach_id: CoachId, start: String },

    #[error("Booking {0} not found")]
    NotFound(BookingId),

    /// Transient or backing-store failure.
    #[error("Storage error: {0}")]
    StorageError(#[source] RepositoryError),
}

/// Discriminant of [`BookingError`] for transport mapping and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    InvalidTimezone,
    CoachNotFound,
    BoundaryViolation,
    OutsideAvailability,
    SlotConflict,
    NotFound,
    StorageError,
}

impl ErrorKind {
    /// Stable upper-snake code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedInput => "MALFORMED_INPUT",
            Self::InvalidTimezone => "INVALID_TIMEZONE",
            Self::CoachNotFound => "COACH_NOT_FOUND",
            Self::BoundaryViolation => "BOUNDARY_VIOLATION",
            Self::OutsideAvailability => "OUTSIDE_AVAILABILITY",
            Self::SlotConflict => "SLOT_CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::StorageError => "STORAGE_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::InvalidTimezone(_) => ErrorKind::InvalidTimezone,
            Self::CoachNotFound(_) => ErrorKind::CoachNotFound,
            Self::BoundaryViolation(_) => ErrorKind::BoundaryViolation,
            Self::OutsideAvailability(_) => ErrorKind::OutsideAvailability,
            Self::SlotConflict { .. } => ErrorKind::SlotConflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::StorageError(_) => ErrorKind::StorageError,
        }
    }

    /// Whether the caller's input was at fault (as opposed to state or storage).
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MalformedInput
                | ErrorKind::InvalidTimezone
                | ErrorKind::BoundaryViolation
                | ErrorKind::OutsideAvailability
        )
    }
}

impl From<RepositoryError> for BookingError {
    fn from(err: RepositoryError) -> Self {
        BookingError::StorageError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_code() {
        let err = BookingError::SlotConflict {
            coach_id: CoachId::new(3),
            start: "2025-01-07T03:30:00Z".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::SlotConflict);
        assert_eq!(err.kind().code(), "SLOT_CONFLICT");
        assert!(err.to_string().contains("already booked"));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_repository_error_becomes_storage_error() {
        let err: BookingError = RepositoryError::connection("pool exhausted").into();
        assert_eq!(err.kind(), ErrorKind::StorageError);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_classification() {
        assert!(BookingError::MalformedInput("x".into()).is_validation());
        assert!(BookingError::BoundaryViolation("x".into()).is_validation());
        assert!(!BookingError::CoachNotFound(CoachId::new(1)).is_validation());
        assert!(!BookingError::NotFound(BookingId::new(1)).is_validation());
    }
}
