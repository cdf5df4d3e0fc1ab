//! HTTP layer against the in-memory store, with a scripted clock.

use actix_web::dev::{Service, ServiceResponse};
use actix_web::web::Data;
use actix_web::{App, test};
use badgetrack::api::AppState;
use badgetrack::clock::{Clock, ManualClock};
use badgetrack::config::Config;
use badgetrack::engine::SessionEngine;
use badgetrack::routes;
use badgetrack::schedule::{Period, Schedule};
use badgetrack::store::memory::MemoryStore;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use std::sync::Arc;

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 7, hour, min, 0).unwrap()
}

fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".to_string(),
        database_url: String::new(),
        timezone: chrono_tz::UTC,
        schedule_path: String::new(),
        presence_threshold: 0.10,
        rate_scan_per_min: 6000,
        rate_register_per_min: 6000,
        rate_read_per_min: 6000,
        api_prefix: "/api".to_string(),
    }
}

/// Hour1 = [08:40, 09:40), Hour2 = [09:40, 10:40), in UTC.
fn engine() -> SessionEngine {
    let schedule = Schedule::new(vec![
        Period {
            name: "Hour1".into(),
            start_minute: 520,
            end_minute: 580,
        },
        Period {
            name: "Hour2".into(),
            start_minute: 580,
            end_minute: 640,
        },
    ])
    .unwrap();
    SessionEngine::new(Arc::new(schedule), chrono_tz::UTC, 0.10)
}

async fn spawn_app(
    clock: Arc<ManualClock>,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let state = Data::new(AppState {
        store: MemoryStore::new(),
        engine: engine(),
        clock: clock as Arc<dyn Clock>,
    });

    test::init_service(
        App::new()
            .app_data(state)
            .configure(|cfg| routes::configure::<MemoryStore>(cfg, test_config())),
    )
    .await
}

fn post_json(uri: &str, body: Value) -> actix_http::Request {
    test::TestRequest::post()
        .uri(uri)
        .peer_addr("127.0.0.1:9999".parse().unwrap())
        .set_json(body)
        .to_request()
}

fn get(uri: &str) -> actix_http::Request {
    test::TestRequest::get()
        .uri(uri)
        .peer_addr("127.0.0.1:9999".parse().unwrap())
        .to_request()
}

async fn register(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    token: &str,
    name: &str,
) {
    let resp = test::call_service(
        app,
        post_json(
            "/api/subjects",
            json!({"card_token": token, "display_name": name}),
        ),
    )
    .await;
    assert_eq!(resp.status(), 201);
}

#[actix_web::test]
async fn missing_card_id_is_rejected() {
    let app = spawn_app(Arc::new(ManualClock::new(at(9, 0)))).await;

    let resp = test::call_service(&app, post_json("/api/rfid", json!({}))).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid request: cardID is required");
}

#[actix_web::test]
async fn unknown_card_is_not_found() {
    let app = spawn_app(Arc::new(ManualClock::new(at(9, 0)))).await;

    let resp =
        test::call_service(&app, post_json("/api/rfid", json!({"cardID": "NOBODY-001"}))).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app(Arc::new(ManualClock::new(at(9, 0)))).await;
    register(&app, "DUPE-0001", "First").await;

    let resp = test::call_service(
        &app,
        post_json(
            "/api/subjects",
            json!({"card_token": "DUPE-0001", "display_name": "Second"}),
        ),
    )
    .await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn scan_toggles_and_day_report_shows_period_split() {
    let clock = Arc::new(ManualClock::new(at(9, 10)));
    let app = spawn_app(clock.clone()).await;
    register(&app, "FLOW-0001", "Ada Lovelace").await;

    // 09:10 — enter.
    let resp = test::call_service(&app, post_json("/api/rfid", json!({"cardID": "FLOW-0001"}))).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "entered");
    assert_eq!(body["subjectName"], "Ada Lovelace");

    // 10:10 — exit; the hour splits 30/30 across the two periods.
    clock.set(at(10, 10));
    let resp = test::call_service(&app, post_json("/api/rfid", json!({"cardID": "FLOW-0001"}))).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "exited");

    let resp = test::call_service(&app, get("/api/attendance/FLOW-0001/2026-08-07")).await;
    assert_eq!(resp.status(), 200);
    let report: Value = test::read_body_json(resp).await;

    assert_eq!(report["subject_name"], "Ada Lovelace");
    assert_eq!(report["checked_in"], false);
    assert_eq!(report["periods"][0]["name"], "Hour1");
    assert_eq!(report["periods"][0]["duration_minutes"], 30);
    assert_eq!(report["periods"][0]["present"], true);
    assert_eq!(report["periods"][1]["name"], "Hour2");
    assert_eq!(report["periods"][1]["duration_minutes"], 30);
    assert_eq!(report["periods"][1]["present"], true);
}

#[actix_web::test]
async fn out_of_order_scan_is_a_conflict() {
    let clock = Arc::new(ManualClock::new(at(10, 0)));
    let app = spawn_app(clock.clone()).await;
    register(&app, "SKEW-0001", "Grace Hopper").await;

    let resp = test::call_service(&app, post_json("/api/rfid", json!({"cardID": "SKEW-0001"}))).await;
    assert_eq!(resp.status(), 200);

    // Device clock jumped backwards; the record must stay open.
    clock.set(at(9, 50));
    let resp = test::call_service(&app, post_json("/api/rfid", json!({"cardID": "SKEW-0001"}))).await;
    assert_eq!(resp.status(), 409);

    clock.set(at(10, 5));
    let resp = test::call_service(&app, post_json("/api/rfid", json!({"cardID": "SKEW-0001"}))).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "exited");
}

#[actix_web::test]
async fn badge_tokens_are_case_insensitive() {
    let clock = Arc::new(ManualClock::new(at(9, 0)));
    let app = spawn_app(clock).await;
    register(&app, "case-0001", "Mixed Case").await;

    let resp =
        test::call_service(&app, post_json("/api/rfid", json!({"cardID": "CASE-0001"}))).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn day_without_record_is_not_found() {
    let app = spawn_app(Arc::new(ManualClock::new(at(9, 0)))).await;
    register(&app, "IDLE-0001", "Never Scanned").await;

    let resp = test::call_service(&app, get("/api/attendance/IDLE-0001/2026-08-07")).await;
    assert_eq!(resp.status(), 404);
}
