#![allow(clippy::unwrap_used)]
// Lifecycle tests for `Integration` and `validate_credentials` against wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use perenio_api::Endpoints;
use perenio_core::{CoreError, FlowError, Integration, IntegrationConfig, validate_credentials};

const TOKEN_PATH: &str = "/auth/protocol/openid-connect/token";

async fn server() -> (MockServer, IntegrationConfig) {
    let server = MockServer::start().await;
    let mut config = IntegrationConfig::new("a@b.com", "x");
    config.endpoints = Endpoints::new(
        &format!("{}/auth", server.uri()),
        &format!("{}/api/v1", server.uri()),
    )
    .unwrap();
    config.timeout = Duration::from_secs(5);

    Mock::given(method("GET"))
        .and(path("/auth/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.com"})))
        .mount(&server)
        .await;

    (server, config)
}

async fn accept_login(server: &MockServer, expires_in: i64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "expires_in": expires_in,
        })))
        .mount(server)
        .await;
}

async fn reject_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(server)
        .await;
}

async fn serve_devices(server: &MockServer, devices: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices))
        .mount(server)
        .await;
}

// ── setup_entry ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_setup_entry_not_ready_on_rejected_login() {
    let (server, config) = server().await;
    reject_login(&server).await;

    let err = Integration::setup_entry(config).await.err().unwrap();
    assert!(matches!(
        err,
        CoreError::NotReady {
            source: Some(perenio_api::Error::Authentication { .. }),
            ..
        }
    ));
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_setup_entry_not_ready_keeps_transport_error() {
    let (_server, mut config) = server().await;
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dead = format!("http://127.0.0.1:{port}/auth");
    config.endpoints = Endpoints::new(&dead, &dead).unwrap();

    let err = Integration::setup_entry(config).await.err().unwrap();
    assert!(matches!(
        err,
        CoreError::NotReady {
            source: Some(perenio_api::Error::Transport(_)),
            ..
        }
    ));
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn test_setup_entry_and_unload() {
    let (server, config) = server().await;
    accept_login(&server, 3600).await;

    let integration = Integration::setup_entry(config).await.unwrap();
    assert!(integration.client().is_open());
    assert!(integration.client().has_access_token().await);

    assert!(integration.unload().await);
    assert!(!integration.client().is_open());
    assert!(!integration.unload().await);
}

// ── discover_cameras ────────────────────────────────────────────────

#[tokio::test]
async fn test_discover_cameras_skips_devices_without_id() {
    let (server, config) = server().await;
    accept_login(&server, 3600).await;
    serve_devices(
        &server,
        json!([
            {"id": "cam1", "name": "Porch"},
            {"name": "no id"},
            {"endpointId": 7}
        ]),
    )
    .await;

    let integration = Integration::setup_entry(config).await.unwrap();
    let cameras = integration.discover_cameras().await;

    let ids: Vec<&str> = cameras.iter().map(|c| c.camera_id()).collect();
    assert_eq!(ids, vec!["cam1", "7"]);
    assert_eq!(cameras[1].name(), "Camera 7");
    assert_eq!(integration.cameras().await.len(), 2);
    assert_eq!(integration.camera("7").await.unwrap().unique_id(), "perenio_7");
    assert!(matches!(
        integration.camera("nope").await,
        Err(CoreError::CameraNotFound { .. })
    ));
}

#[tokio::test]
async fn test_discover_cameras_empty_when_discovery_fails() {
    let (server, config) = server().await;
    accept_login(&server, 3600).await;
    // No discovery mocks: every candidate answers 404.

    let integration = Integration::setup_entry(config).await.unwrap();
    assert!(integration.discover_cameras().await.is_empty());
}

#[tokio::test]
async fn test_camera_image_and_stream_source() {
    let (server, config) = server().await;
    accept_login(&server, 3600).await;
    serve_devices(&server, json!([{"id": "cam1"}])).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/file/cam1/snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPEG".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/mediastream/cam1/offer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sdp": "v=0"})))
        .expect(1)
        .mount(&server)
        .await;

    let integration = Integration::setup_entry(config).await.unwrap();
    let camera = integration.discover_cameras().await.remove(0);

    assert!(camera.available().await);
    assert_eq!(camera.camera_image().await.unwrap().as_ref(), b"JPEG");
    assert_eq!(camera.stream_source().await, None);
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_polling_refreshes_and_stops_on_unload() {
    let (server, mut config) = server().await;
    config.scan_interval = Duration::from_millis(50);
    // Every grant is already inside the refresh margin.
    accept_login(&server, 60).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T2",
            "expires_in": 60,
        })))
        .mount(&server)
        .await;
    serve_devices(&server, json!([{"id": "cam1"}])).await;

    let integration = Integration::setup_entry(config).await.unwrap();
    integration.discover_cameras().await;
    integration.spawn_polling().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    integration.unload().await;

    let refreshes = |requests: &[wiremock::Request]| {
        requests
            .iter()
            .filter(|r| String::from_utf8_lossy(&r.body).contains("grant_type=refresh_token"))
            .count()
    };
    let after_unload = refreshes(&server.received_requests().await.unwrap());
    assert!(after_unload >= 1, "polling should have refreshed the token");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(refreshes(&server.received_requests().await.unwrap()), after_unload);
}

#[tokio::test]
async fn test_zero_scan_interval_disables_polling() {
    let (server, mut config) = server().await;
    config.scan_interval = Duration::ZERO;
    accept_login(&server, 3600).await;

    let integration = Integration::setup_entry(config).await.unwrap();
    integration.spawn_polling().await;
    assert!(integration.unload().await);
}

// ── validate_credentials ────────────────────────────────────────────

#[tokio::test]
async fn test_validate_credentials_success() {
    let (server, config) = server().await;
    accept_login(&server, 3600).await;

    assert_eq!(validate_credentials(&config).await.unwrap(), "Perenio (a@b.com)");
}

#[tokio::test]
async fn test_validate_credentials_invalid_auth() {
    let (server, config) = server().await;
    reject_login(&server).await;

    let err = validate_credentials(&config).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidAuth));
    assert_eq!(err.key(), "invalid_auth");
}
