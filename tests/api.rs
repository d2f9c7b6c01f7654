use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use shift_clock::{
    create_router,
    models::{Shift, ShiftKind},
    services::{ManualClock, SilentAlarm, StaticShifts},
    store::MemorySessionStore,
    AppState, ShiftTimer,
};

fn local(h: u32, m: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(2026, 6, 15, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn test_app(now: DateTime<Utc>) -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let shifts = Arc::new(StaticShifts::new(vec![Shift {
        id: "shift-1".to_string(),
        client_label: "Mrs. Alvarez".to_string(),
        start_at: local(9, 0),
        end_at: local(17, 0),
        kind: ShiftKind::Work,
    }]));
    let timer = ShiftTimer::new(
        shifts,
        Arc::new(MemorySessionStore::new()),
        Arc::new(SilentAlarm),
        clock.clone(),
    );
    let state = Arc::new(AppState::new(timer, 20554, "127.0.0.1".to_string()));
    state.refresh().unwrap();
    (create_router(state), clock)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (app, _clock) = test_app(local(8, 0));
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_reports_waiting_shift() {
    let (app, _clock) = test_app(local(8, 0));
    let (status, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["status"], "waiting");
    assert_eq!(body["timer"]["totalShiftSeconds"], 28_800);
    assert_eq!(body["timer"]["alarmActive"], false);
    assert_eq!(body["timer"]["shift"]["clientName"], "Mrs. Alvarez");
}

#[tokio::test]
async fn test_start_before_shift_is_conflict() {
    let (app, _clock) = test_app(local(8, 0));
    let (status, body) = call(&app, "POST", "/start", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    assert_eq!(body["timer"]["status"], "waiting");
}

#[tokio::test]
async fn test_shift_lifecycle_over_http() {
    let (app, clock) = test_app(local(9, 0));

    let (_, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(body["timer"]["status"], "start_alarm");
    assert_eq!(body["timer"]["alarmActive"], true);

    let (status, body) = call(&app, "POST", "/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["status"], "active");
    assert_eq!(body["timer"]["secondsRemaining"], 28_800);

    clock.advance(Duration::minutes(10));
    let (_, body) = call(&app, "POST", "/pause", None).await;
    assert_eq!(body["timer"]["status"], "paused");
    assert_eq!(body["timer"]["secondsRemaining"], 28_200);

    let (_, body) = call(&app, "POST", "/resume", None).await;
    assert_eq!(body["timer"]["status"], "active");

    let (status, body) = call(&app, "POST", "/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["status"], "completed");

    let (_, body) = call(&app, "GET", "/sessions", None).await;
    assert_eq!(body["shift_id"], "shift-1");
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0]["clockOutAt"].is_null());

    let (_, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(body["last_action"], "stop");
}

#[tokio::test]
async fn test_refresh_and_reset() {
    let (app, clock) = test_app(local(8, 30));
    clock.set(local(9, 5));

    let (status, body) = call(&app, "POST", "/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["status"], "start_alarm");

    call(&app, "POST", "/start", None).await;
    let (_, body) = call(&app, "POST", "/reset", None).await;
    assert_eq!(body["timer"]["status"], "start_alarm");
    assert!(body["timer"]["session"].is_null());
}

#[tokio::test]
async fn test_alarm_settings_update() {
    let (app, _clock) = test_app(local(8, 0));
    let (status, body) = call(
        &app,
        "POST",
        "/alarm-settings",
        Some(serde_json::json!({ "sound": "fanfare", "volume": 60 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sound"], "fanfare");

    let (_, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(body["alarm"]["volume"], 60);

    let (status, _) = call(
        &app,
        "POST",
        "/alarm-settings",
        Some(serde_json::json!({ "sound": "fanfare", "volume": 200 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
