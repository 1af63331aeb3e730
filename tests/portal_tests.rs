//! Integration tests for the provisioning portal HTTP routes.

#![cfg(feature = "portal")]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use smart_blinds::provisioning::PortalSession;
use smart_blinds::services::{build_portal_router, SharedPortal, WebPortal};
use smart_blinds::settings::DeviceSettings;
use smart_blinds::traits::Provisioner;
use smart_blinds::PortalConfig;

fn open_portal() -> SharedPortal {
    let mut session = PortalSession::new("SmartBlinds-Setup");
    session.open(&DeviceSettings::new("Kitchen", "10.0.0.2", "ha", "hunter2"));
    Arc::new(Mutex::new(session))
}

fn create_test_app(portal: &SharedPortal) -> axum::Router {
    build_portal_router(Arc::clone(portal), &PortalConfig::default())
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_save(json: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/save")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_index_serves_prefilled_form() {
    let portal = open_portal();
    let app = create_test_app(&portal);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let html = body_string(response).await;
    assert!(html.contains("SmartBlinds-Setup"));
    assert!(html.contains(r#"value="Kitchen""#));
    assert!(html.contains(r#"value="10.0.0.2""#));
    assert!(!html.contains("hunter2"));
}

#[tokio::test]
async fn test_save_accepts_valid_settings() {
    let portal = open_portal();
    let app = create_test_app(&portal);

    let response = app
        .oneshot(post_save(
            r#"{"deviceName":" Study ","mqttServer":"10.0.0.3","mqttUsername":"","mqttPassword":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"ok":true}"#);

    let submitted = portal.lock().unwrap().take_submission().unwrap();
    assert_eq!(submitted.device_name, "Study");
    assert_eq!(submitted.broker_address, "10.0.0.3");
}

#[tokio::test]
async fn test_save_rejects_invalid_settings() {
    let cases = [
        ("not json", "invalid settings"),
        (r#"{"deviceName":"","mqttServer":"10.0.0.3"}"#, "device name is required"),
        (
            r#"{"deviceName":"a#b","mqttServer":"10.0.0.3"}"#,
            "device name may not contain / + or #",
        ),
        (r#"{"deviceName":"Study","mqttServer":"  "}"#, "MQTT server is required"),
    ];

    for (body, message) in cases {
        let portal = open_portal();
        let app = create_test_app(&portal);

        let response = app.oneshot(post_save(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"], message);
        assert!(portal.lock().unwrap().take_submission().is_none());
    }
}

#[tokio::test]
async fn test_settings_withholds_password() {
    let portal = open_portal();
    let app = create_test_app(&portal);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/settings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(!body.contains("hunter2"));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["deviceName"], "Kitchen");
    assert_eq!(json["mqttServer"], "10.0.0.2");
    assert_eq!(json["mqttUsername"], "ha");
    assert_eq!(json["hasPassword"], true);
}

#[tokio::test]
async fn test_closed_portal_answers_unavailable() {
    let portal: SharedPortal = Arc::new(Mutex::new(PortalSession::new("SmartBlinds-Setup")));
    let app = create_test_app(&portal);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .oneshot(post_save(r#"{"deviceName":"Study","mqttServer":"10.0.0.3"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let portal = open_portal();
    let app = create_test_app(&portal);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_requires_post() {
    let portal = open_portal();
    let app = create_test_app(&portal);

    let response = app
        .oneshot(Request::builder().uri("/save").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_headers_when_permissive() {
    let portal = open_portal();
    let config = PortalConfig::default().with_cors(true);
    let app = build_portal_router(Arc::clone(&portal), &config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/settings")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[test]
fn web_portal_hands_back_submission_once() {
    let addr = "127.0.0.1:0".parse().unwrap();
    let mut portal = WebPortal::with_addr(PortalConfig::default(), addr);
    assert!(!portal.is_open());

    portal.open(&DeviceSettings::default()).unwrap();
    assert!(portal.is_open());

    let response = portal
        .session()
        .lock()
        .unwrap()
        .handle_save(r#"{"deviceName":"Kitchen","mqttServer":"10.0.0.2"}"#);
    assert!(response.is_ok());

    assert_eq!(portal.poll().unwrap().device_name, "Kitchen");
    assert!(portal.poll().is_none());

    portal.close();
    assert!(!portal.is_open());
}
