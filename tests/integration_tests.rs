use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinic_booking::config::ClinicInfo;
use clinic_booking::handlers;
use clinic_booking::models::{Booking, Slot};
use clinic_booking::services::messaging::relay::HttpMailRelay;
use clinic_booking::services::notification::Notifier;
use clinic_booking::state::AppState;
use clinic_booking::store::{BookingStore, JsonFileStore, MemoryStore, SqliteStore, StoreError};

// ── Helpers ──

fn clinic() -> ClinicInfo {
    ClinicInfo {
        name: "Test Clinic".to_string(),
        phone: "+91 80055 86588".to_string(),
        whatsapp_number: Some("+91 80055 86588".to_string()),
    }
}

fn test_state_with(store: Arc<dyn BookingStore>, notifier: Notifier, admin_token: &str) -> Arc<AppState> {
    Arc::new(AppState {
        store,
        notifier,
        admin_token: admin_token.to_string(),
        store_timeout: Duration::from_secs(2),
    })
}

fn test_state(store: Arc<dyn BookingStore>) -> Arc<AppState> {
    test_state_with(store, Notifier::disabled(clinic(), Duration::from_secs(1)), "")
}

fn relay_notifier(relay_url: String) -> Notifier {
    Notifier::with_transport(
        Box::new(HttpMailRelay::new(
            relay_url,
            "clinic@example.com".to_string(),
            "secret".to_string(),
        )),
        "clinic@example.com".to_string(),
        "staff@example.com".to_string(),
        clinic(),
        Duration::from_secs(2),
    )
}

fn booking_body(time: &str) -> serde_json::Value {
    serde_json::json!({
        "service": "Chronic Pain Relief",
        "date": "2025-03-01",
        "time": time,
        "name": "A",
        "phone": "1",
        "email": "a@b.com"
    })
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_raw(uri: &str, content_type: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("Content-Type", content_type);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Finds nothing and refuses every write.
struct UnavailableStore;

#[async_trait]
impl BookingStore for UnavailableStore {
    async fn insert(&self, _booking: &Booking) -> Result<(), StoreError> {
        Err(StoreError::NotAcknowledged)
    }
    async fn find_by_slot(&self, _slot: &Slot<'_>) -> Result<Option<Booking>, StoreError> {
        Ok(None)
    }
    async fn get(&self, _id: &str) -> Result<Option<Booking>, StoreError> {
        Err(StoreError::Other(anyhow::anyhow!("store offline")))
    }
    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        Err(StoreError::Other(anyhow::anyhow!("store offline")))
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ── Booking intake ──

#[tokio::test]
async fn test_same_slot_twice_conflicts() {
    let store = Arc::new(MemoryStore::new());
    let app = handlers::router(test_state(store.clone()));

    let (status, json) = send(&app, post_json("/api/booking", &booking_body("10:00"))).await;
    assert_eq!(status, StatusCode::OK);
    let id = json["bookingId"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(json["notified"], false);

    let (status, json) = send(&app, post_json("/api/booking", &booking_body("10:00"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("already booked"));

    let all = store.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = handlers::router(test_state(store.clone()));

    let mut body = booking_body("10:00");
    body["email"] = serde_json::json!("not-an-email");
    let (status, json) = send(&app, post_json("/api/booking", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid email format");
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_field_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = handlers::router(test_state(store.clone()));

    let mut body = booking_body("10:00");
    body.as_object_mut().unwrap().remove("name");
    body["phone"] = serde_json::json!("   ");
    let (status, json) = send(&app, post_json("/api/booking", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let msg = json["error"].as_str().unwrap();
    assert!(msg.contains("name"));
    assert!(msg.contains("phone"));
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_service_rejected() {
    let app = handlers::router(test_state(Arc::new(MemoryStore::new())));
    let mut body = booking_body("10:00");
    body["service"] = serde_json::json!("Acupuncture");
    let (status, _) = send(&app, post_json("/api/booking", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mistyped_field_is_json_bad_request() {
    let store = Arc::new(MemoryStore::new());
    let app = handlers::router(test_state(store.clone()));

    let mut body = booking_body("10:00");
    body["phone"] = serde_json::json!(9876543210u64);
    let (status, json) = send(&app, post_json("/api/booking", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("phone"));
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_json_bad_request() {
    let app = handlers::router(test_state(Arc::new(MemoryStore::new())));

    for uri in ["/api/booking", "/api/subscribe"] {
        let (status, json) = send(&app, post_raw(uri, Some("application/json"), "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["error"].is_string(), "{uri}");

        let (status, json) = send(&app, post_raw(uri, None, r#"{"email":"a@b.com"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_unpadded_date_and_time_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = handlers::router(test_state(store.clone()));

    let (status, _) = send(&app, post_json("/api/booking", &booking_body("09:05"))).await;
    assert_eq!(status, StatusCode::OK);

    let mut body = booking_body("9:5");
    body["date"] = serde_json::json!("2025-3-1");
    let (status, json) = send(&app, post_json("/api/booking", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid date"));

    let (status, json) = send(&app, post_json("/api/booking", &booking_body("9:05"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid time"));

    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_store_failure_is_json_server_error() {
    let app = handlers::router(test_state(Arc::new(UnavailableStore)));

    let (status, json) = send(&app, post_json("/api/booking", &booking_body("10:00"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().starts_with("failed to save booking"));
    assert!(json.get("bookingId").is_none());

    let (status, json) = send(&app, get("/api/booking")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_concurrent_different_times_both_succeed() {
    let store = Arc::new(SqliteStore::open(":memory:").unwrap());
    let app = handlers::router(test_state(store.clone()));

    let (a, b) = tokio::join!(
        send(&app, post_json("/api/booking", &booking_body("10:00"))),
        send(&app, post_json("/api/booking", &booking_body("10:30"))),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_same_slot_only_one_wins() {
    let store = Arc::new(SqliteStore::open(":memory:").unwrap());
    let app = handlers::router(test_state(store.clone()));

    let (a, b) = tokio::join!(
        send(&app, post_json("/api/booking", &booking_body("12:00"))),
        send(&app, post_json("/api/booking", &booking_body("12:00"))),
    );
    let mut statuses = [a.0.as_u16(), b.0.as_u16()];
    statuses.sort();
    assert_eq!(statuses, [200, 409]);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_time_different_service_allowed() {
    let store = Arc::new(MemoryStore::new());
    let app = handlers::router(test_state(store.clone()));

    let (status, _) = send(&app, post_json("/api/booking", &booking_body("10:00"))).await;
    assert_eq!(status, StatusCode::OK);

    let mut body = booking_body("10:00");
    body["service"] = serde_json::json!("Sports Injury Rehab");
    let (status, _) = send(&app, post_json("/api/booking", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_file_store_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookings.json");
    let app = handlers::router(test_state(Arc::new(JsonFileStore::new(&path))));

    let (status, _) = send(&app, post_json("/api/booking", &booking_body("14:00"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, post_json("/api/booking", &booking_body("14:00"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let on_disk: Vec<serde_json::Value> =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0]["time"], "14:00");
}

#[tokio::test]
async fn test_whatsapp_link_returned() {
    let app = handlers::router(test_state(Arc::new(MemoryStore::new())));
    let (status, json) = send(&app, post_json("/api/booking", &booking_body("15:00"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["whatsappUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://wa.me/918005586588?text="));
}

// ── Notifications ──

#[tokio::test]
async fn test_emails_sent_through_relay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let state = test_state_with(Arc::new(MemoryStore::new()), relay_notifier(server.uri()), "");
    let app = handlers::router(state);

    let (status, json) = send(&app, post_json("/api/booking", &booking_body("09:00"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["notified"], true);
}

#[tokio::test]
async fn test_relay_failure_does_not_fail_booking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let state = test_state_with(store.clone(), relay_notifier(server.uri()), "");
    let app = handlers::router(state);

    let (status, json) = send(&app, post_json("/api/booking", &booking_body("09:00"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["notified"], false);

    let id = json["bookingId"].as_str().unwrap();
    let (status, fetched) = send(&app, get(&format!("/api/booking/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["service"], "Chronic Pain Relief");
}

// ── Listing ──

#[tokio::test]
async fn test_list_bookings_newest_first() {
    let app = handlers::router(test_state(Arc::new(MemoryStore::new())));
    for time in ["09:00", "09:30"] {
        let (status, _) = send(&app, post_json("/api/booking", &booking_body(time))).await;
        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let (status, json) = send(&app, get("/api/booking")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["bookings"][0]["time"], "09:30");
    assert_eq!(json["bookings"][1]["time"], "09:00");
    assert!(json["bookings"][0]["bookedAt"].is_string());

    let (_, again) = send(&app, get("/api/booking")).await;
    assert_eq!(json, again);
}

#[tokio::test]
async fn test_list_requires_token_when_configured() {
    let state = test_state_with(
        Arc::new(MemoryStore::new()),
        Notifier::disabled(clinic(), Duration::from_secs(1)),
        "test-token",
    );
    let app = handlers::router(state);

    let (status, _) = send(&app, get("/api/booking")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/booking")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/booking")
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 0);

    // submitting stays open
    let (status, _) = send(&app, post_json("/api/booking", &booking_body("10:00"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_get_unknown_booking() {
    let app = handlers::router(test_state(Arc::new(MemoryStore::new())));
    let (status, json) = send(&app, get("/api/booking/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

// ── Subscribe & health ──

#[tokio::test]
async fn test_subscribe_validation() {
    let app = handlers::router(test_state(Arc::new(MemoryStore::new())));

    let (status, json) = send(&app, post_json("/api/subscribe", &serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Email is required");

    let (status, json) = send(
        &app,
        post_json("/api/subscribe", &serde_json::json!({"email": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid email format");

    let (status, json) = send(
        &app,
        post_json("/api/subscribe", &serde_json::json!({"email": "reader@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Subscription successful");
}

#[tokio::test]
async fn test_subscribe_relay_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let state = test_state_with(Arc::new(MemoryStore::new()), relay_notifier(server.uri()), "");
    let app = handlers::router(state);

    let (status, _) = send(
        &app,
        post_json("/api/subscribe", &serde_json::json!({"email": "reader@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_health() {
    let app = handlers::router(test_state(Arc::new(MemoryStore::new())));
    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}
