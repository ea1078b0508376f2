//! # Coach Booking
//!
//! Appointment booking between users and coaches. Coaches publish weekly
//! recurring availability in their own IANA timezone; users query 30-minute
//! slots for a local date and book one. At most one booking can exist per
//! `(coach, start instant)`, enforced by storage so concurrent attempts
//! resolve to exactly one winner.
//!
//! ## Architecture
//!
//! - [`models`]: ids, entities and local/UTC time conversion
//! - [`error`]: the [`BookingError`](error::BookingError) taxonomy
//! - [`db`]: repository traits and the in-memory / Postgres backends
//! - [`services`]: availability catalog, slot generator, booking ledger,
//!   booking validator and the operations transports call
//! - [`http`]: axum REST API (feature `http-server`)

// RepositoryError carries structured context.
#![allow(clippy::result_large_err)]

pub mod db;
pub mod error;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
