//! HTTP handlers for the REST API.
//!
//! Handlers decode the request, call into [`crate::services`] and render the
//! result; all domain validation lives in the service layer.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::dto::{
    BookingCreatedResponse, BookingDto, BookingListResponse, BookingsQuery, CreateAvailabilityRequest,
    CreateBookingRequest, CreateCoachRequest, CreatedResponse, HealthResponse, SlotsQuery,
    SlotsResponse, StatusResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::CoachRepository;
use crate::error::BookingError;
use crate::models::{
    format_instant, parse_instant, parse_local_date, BookingId, CoachId, UserId,
};
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, BookingError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BookingError::MalformedInput(format!("{} is required", name)))
}

fn parse_id<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, BookingError> {
    raw.parse()
        .map_err(|_| BookingError::MalformedInput(format!("{} must be an integer", name)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Coaches
// =============================================================================

/// POST /v1/coaches
pub async fn create_coach(
    State(state): State<AppState>,
    payload: Result<Json<CreateCoachRequest>, JsonRejection>,
) -> CreatedResult<CreatedResponse> {
    let Json(request) = payload?;
    let coach =
        services::create_coach(state.repository.as_ref(), &request.name, &request.timezone)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: coach.id.value(),
        }),
    ))
}

/// POST /v1/coaches/availability
pub async fn create_availability(
    State(state): State<AppState>,
    payload: Result<Json<CreateAvailabilityRequest>, JsonRejection>,
) -> CreatedResult<CreatedResponse> {
    let Json(request) = payload?;
    let window = services::add_availability(
        state.repository.as_ref(),
        CoachId::new(request.coach_id),
        request.day,
        &request.start_time,
        &request.end_time,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: window.id.value(),
        }),
    ))
}

// =============================================================================
// Users: slots and bookings
// =============================================================================

/// GET /v1/users/slots?coach_id=1&date=YYYY-MM-DD
///
/// `date` is a calendar date in the coach's timezone.
pub async fn get_slots(
    State(state): State<AppState>,
    query: Result<Query<SlotsQuery>, QueryRejection>,
) -> HandlerResult<SlotsResponse> {
    let Query(query) = query?;
    let coach_id: CoachId = parse_id(required(&query.coach_id, "coach_id")?, "coach_id")?;
    let date = parse_local_date(required(&query.date, "date")?)?;

    let available = services::query_slots(state.repository.as_ref(), coach_id, date).await?;
    Ok(Json(SlotsResponse {
        slots: available.slots.into_iter().map(format_instant).collect(),
        timezone: available.timezone.name().to_string(),
    }))
}

/// POST /v1/users/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> CreatedResult<BookingCreatedResponse> {
    let Json(request) = payload?;
    let booking = services::create_booking(
        state.repository.as_ref(),
        UserId::new(request.user_id),
        CoachId::new(request.coach_id),
        &request.datetime,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            status: "booked".to_string(),
            start: format_instant(booking.start),
        }),
    ))
}

/// GET /v1/users/bookings?user_id=1[&from=RFC3339]
pub async fn list_bookings(
    State(state): State<AppState>,
    query: Result<Query<BookingsQuery>, QueryRejection>,
) -> HandlerResult<BookingListResponse> {
    let Query(query) = query?;
    let user_id: UserId = parse_id(required(&query.user_id, "user_id")?, "user_id")?;
    let from = match query.from.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_instant(raw.trim())?,
        _ => Utc::now(),
    };

    let bookings =
        services::list_user_bookings(state.repository.as_ref(), user_id, from).await?;
    Ok(Json(BookingListResponse {
        bookings: bookings.into_iter().map(BookingDto::from).collect(),
    }))
}

/// DELETE /v1/users/bookings/{booking_id}
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> HandlerResult<StatusResponse> {
    let booking_id: BookingId = parse_id(&booking_id, "booking id")?;
    services::cancel_booking(state.repository.as_ref(), booking_id).await?;
    Ok(Json(StatusResponse {
        status: "cancelled".to_string(),
    }))
}
