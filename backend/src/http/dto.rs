//! Data Transfer Objects for the HTTP API.
//!
//! Instants are always rendered as RFC 3339 UTC strings with a `Z` suffix.

use serde::{Deserialize, Serialize};

use crate::models::{format_instant, Booking};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// `POST /v1/coaches` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCoachRequest {
    pub name: String,
    pub timezone: String,
}

/// `POST /v1/coaches/availability` body. `day` is 0 (Sunday) to 6 (Saturday).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub coach_id: i64,
    pub day: i64,
    pub start_time: String,
    pub end_time: String,
}

/// Id of a newly created resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// `GET /v1/users/slots` query; both parameters are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotsQuery {
    pub coach_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub slots: Vec<String>,
    pub timezone: String,
}

/// `POST /v1/users/bookings` body. `datetime` must carry an explicit offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub user_id: i64,
    pub coach_id: i64,
    pub datetime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedResponse {
    pub status: String,
    pub start: String,
}

/// `GET /v1/users/bookings` query; `from` defaults to now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingsQuery {
    pub user_id: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDto {
    pub id: i64,
    pub coach_id: i64,
    pub start: String,
    pub end: String,
    pub created_at: String,
}

impl From<Booking> for BookingDto {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.value(),
            coach_id: booking.coach_id.value(),
            start: format_instant(booking.start),
            end: format_instant(booking.end),
            created_at: format_instant(booking.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}
