//! Router configuration for the HTTP API.
//!
//! Sets up the routes and middleware (CORS, compression, tracing) and returns
//! an axum router ready for serving.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Coaches
        .route("/coaches", post(handlers::create_coach))
        .route("/coaches/availability", post(handlers::create_availability))
        // Users
        .route("/users/slots", get(handlers::get_slots))
        .route(
            "/users/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/users/bookings/{booking_id}", delete(handlers::cancel_booking));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
