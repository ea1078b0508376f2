//! End-to-end tests of the REST API through the axum router.

#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use coach_booking::db::LocalRepository;
use coach_booking::http::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (Router, LocalRepository) {
    let repo = LocalRepository::new();
    let router = create_router(AppState::new(Arc::new(repo.clone())));
    (router, repo)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn kolkata_coach(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/coaches",
        Some(json!({"name": "Asha", "timezone": "Asia/Kolkata"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let coach_id = body["id"].as_i64().unwrap();

    let (status, body) = send(
        app,
        Method::POST,
        "/v1/coaches/availability",
        Some(json!({"coach_id": coach_id, "day": 2, "start_time": "09:00", "end_time": "12:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().is_some());
    coach_id
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_booking_flow() {
    let (app, repo) = app();
    let coach_id = kolkata_coach(&app).await;

    let slots_uri = format!("/v1/users/slots?coach_id={}&date=2025-01-07", coach_id);
    let (status, body) = send(&app, Method::GET, &slots_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timezone"], "Asia/Kolkata");
    assert_eq!(
        body["slots"],
        json!([
            "2025-01-07T03:30:00Z",
            "2025-01-07T04:00:00Z",
            "2025-01-07T04:30:00Z",
            "2025-01-07T05:00:00Z",
            "2025-01-07T05:30:00Z",
            "2025-01-07T06:00:00Z"
        ])
    );

    let booking = json!({"user_id": 7, "coach_id": coach_id, "datetime": "2025-01-07T09:30:00+05:30"});
    let (status, body) = send(&app, Method::POST, "/v1/users/bookings", Some(booking.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"status": "booked", "start": "2025-01-07T04:00:00Z"}));

    let (status, body) = send(&app, Method::POST, "/v1/users/bookings", Some(booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SLOT_CONFLICT");
    assert_eq!(repo.booking_count(), 1);

    let (_, body) = send(&app, Method::GET, &slots_uri, None).await;
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 5);
    assert!(!slots.contains(&json!("2025-01-07T04:00:00Z")));

    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/users/bookings?user_id=7&from=2025-01-01T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["start"], "2025-01-07T04:00:00Z");
    assert_eq!(bookings[0]["end"], "2025-01-07T04:30:00Z");

    let booking_id = bookings[0]["id"].as_i64().unwrap();
    let cancel_uri = format!("/v1/users/bookings/{}", booking_id);
    let (status, body) = send(&app, Method::DELETE, &cancel_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, body) = send(&app, Method::DELETE, &cancel_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, body) = send(&app, Method::GET, &slots_uri, None).await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_rejects_unknown_timezone() {
    let (app, repo) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/coaches",
        Some(json!({"name": "Asha", "timezone": "Mars/Olympus"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TIMEZONE");
    assert_eq!(repo.coach_count(), 0);
}

#[tokio::test]
async fn test_rejects_bad_availability() {
    let (app, _) = app();
    let coach_id = kolkata_coach(&app).await;

    for (day, start, end) in [(7, "09:00", "10:00"), (1, "9am", "10:00"), (1, "12:00", "09:00")] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/coaches/availability",
            Some(json!({"coach_id": coach_id, "day": day, "start_time": start, "end_time": end})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{day} {start} {end}");
        assert_eq!(body["code"], "MALFORMED_INPUT");
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/coaches/availability",
        Some(json!({"coach_id": 999, "day": 1, "start_time": "09:00", "end_time": "10:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COACH_NOT_FOUND");
}

#[tokio::test]
async fn test_slots_query_validation() {
    let (app, _) = app();
    let coach_id = kolkata_coach(&app).await;

    let (status, body) = send(&app, Method::GET, "/v1/users/slots?date=2025-01-07", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_INPUT");

    let uri = format!("/v1/users/slots?coach_id={}", coach_id);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/v1/users/slots?coach_id={}&date=07-01-2025", coach_id);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/v1/users/slots?coach_id=abc&date=2025-01-07", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/v1/users/slots?coach_id=999&date=2025-01-07", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COACH_NOT_FOUND");
}

#[tokio::test]
async fn test_booking_validation() {
    let (app, repo) = app();
    let coach_id = kolkata_coach(&app).await;

    let cases = [
        ("2025-01-07T04:15:00Z", "BOUNDARY_VIOLATION"),
        ("2025-01-07 04:00:00", "MALFORMED_INPUT"),
        ("2025-01-07T02:30:00Z", "OUTSIDE_AVAILABILITY"),
        ("2025-01-07T06:30:00Z", "OUTSIDE_AVAILABILITY"),
    ];
    for (datetime, code) in cases {
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/users/bookings",
            Some(json!({"user_id": 1, "coach_id": coach_id, "datetime": datetime})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{datetime}");
        assert_eq!(body["code"], code, "{datetime}");
    }
    assert_eq!(repo.booking_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/users/bookings")
        .header("content-type", "application/json")
        .body(Body::from("{\"user_id\": 1,"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_cancel_with_non_numeric_id() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::DELETE, "/v1/users/bookings/latest", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_INPUT");
}
