use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use serde_json::json;
use tokio::net::TcpListener;

use floodsense_lib::api::{NewAlert, NewSubscription, RiskAssessmentInput};
use floodsense_lib::risk::{sort_by_risk_level, HasRiskLevel, RiskLevel};
use floodsense_lib::auth::MemoryRouter;
use floodsense_lib::http::ReqwestTransport;
use floodsense_lib::{AppConfig, ClientError, ErrorCategory, FloodSense};

use crate::test_harness::{StorageFile, TestApp};

/// Log in against the mock server so later requests carry `Bearer t1`
async fn signed_in(storage: &StorageFile) -> TestApp {
    let mut t = TestApp::start(storage).await;
    let login = t
        .server
        .mock("POST", "/api/admin/login")
        .with_status(200)
        .with_body(r#"{"token":"t1","user":{"username":"admin"}}"#)
        .create_async()
        .await;
    t.app.session().initialize().await;
    t.app.session().login("admin", "Admin@123").await.unwrap();
    login.assert_async().await;
    t
}

#[tokio::test]
async fn test_dashboard_overview() {
    let storage = StorageFile::new();
    let mut t = signed_in(&storage).await;

    let summary = t
        .server
        .mock("GET", "/api/dashboard/summary")
        .match_header("authorization", "Bearer t1")
        .with_status(200)
        .with_body(
            json!({"data": {
                "totalLocations": "3",
                "riskDistribution": {"LOW": 1, "MODERATE": 1, "CRITICAL": 1}
            }})
            .to_string(),
        )
        .create_async()
        .await;
    let locations = t
        .server
        .mock("GET", "/api/locations")
        .match_header("authorization", "Bearer t1")
        .with_status(200)
        .with_body(
            json!({"data": [
                {"id": 1, "name": "Dehiwala", "district": "Colombo", "risk_level": "LOW"},
                {"id": 2, "name": "Kaduwela", "district": "Colombo", "risk_level": "CRITICAL"},
                {"id": 3, "name": "Horana", "district": "Kalutara", "risk_level": "MODERATE"}
            ], "count": 3})
            .to_string(),
        )
        .create_async()
        .await;
    let alerts = t
        .server
        .mock("GET", "/api/dashboard/alerts")
        .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
        .match_header("authorization", "Bearer t1")
        .with_status(200)
        .with_body(r#"{"data":[{"id":7,"message":"Kelani river rising","risk_level":"HIGH"}]}"#)
        .create_async()
        .await;

    let overview = t.app.dashboard.overview().await.unwrap();
    assert_eq!(overview.summary.total_locations, 3);
    assert_eq!(overview.summary.risk_distribution.chart_slices().len(), 3);
    assert_eq!(overview.highest_risk(), Some(RiskLevel::Critical));
    assert_eq!(overview.alerts.items[0].risk_level(), Some(RiskLevel::High));

    let names: Vec<_> = sort_by_risk_level(&overview.locations.items)
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, ["Kaduwela", "Horana", "Dehiwala"]);

    summary.assert_async().await;
    locations.assert_async().await;
    alerts.assert_async().await;
}

#[tokio::test]
async fn test_subscription_management() {
    let storage = StorageFile::new();
    let mut t = signed_in(&storage).await;

    let list = t
        .server
        .mock("GET", "/api/subscriptions")
        .with_status(200)
        .with_body(
            json!({"data": [
                {"id": 4, "userName": "Kamala", "email": "k@mail.lk", "is_active": true,
                 "location": {"id": 2, "name": "Kaduwela"}}
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    let toggle = t
        .server
        .mock("PATCH", "/api/subscriptions/4/toggle")
        .match_header("authorization", "Bearer t1")
        .match_body(Matcher::Json(json!({"is_active": false})))
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;
    let subscribe = t
        .server
        .mock("POST", "/api/subscriptions")
        .match_body(Matcher::Json(json!({"email": "new@mail.lk", "location_id": 2})))
        .with_status(201)
        .with_body(r#"{"message":"Subscribed"}"#)
        .create_async()
        .await;
    let remove = t
        .server
        .mock("DELETE", "/api/subscriptions/4")
        .with_status(204)
        .create_async()
        .await;

    let subs = t.app.subscriptions.list().await.unwrap();
    assert_eq!(subs.items[0].location_name(), "Kaduwela");

    t.app.subscriptions.toggle(4, false).await.unwrap();
    t.app
        .subscriptions
        .subscribe(&NewSubscription::new("new@mail.lk", 2))
        .await
        .unwrap();
    t.app.subscriptions.unsubscribe(4).await.unwrap();

    list.assert_async().await;
    toggle.assert_async().await;
    subscribe.assert_async().await;
    remove.assert_async().await;
}

#[tokio::test]
async fn test_alert_and_risk_submission() {
    let storage = StorageFile::new();
    let mut t = signed_in(&storage).await;

    let broadcast = t
        .server
        .mock("POST", "/api/alerts")
        .match_body(Matcher::Json(json!({
            "location_id": 2,
            "alert_type": "FLOOD",
            "recipient": "PUBLIC",
            "risk_level": "CRITICAL",
            "message": "Evacuate to higher ground",
            "status": "active"
        })))
        .with_status(201)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;
    let risk = t
        .server
        .mock("POST", "/api/risk")
        .match_body(Matcher::PartialJson(json!({
            "location_id": 2,
            "risk_level": "HIGH",
            "risk_score": 7,
            "factors": ["heavy rain", "high tide"]
        })))
        .with_status(201)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;

    t.app
        .alerts
        .broadcast(&NewAlert::new(2, RiskLevel::Critical, "Evacuate to higher ground"))
        .await
        .unwrap();
    t.app
        .readings
        .submit_risk(&RiskAssessmentInput::manual(2, RiskLevel::High, ["heavy rain", "high tide"]))
        .await
        .unwrap();

    broadcast.assert_async().await;
    risk.assert_async().await;
}

#[tokio::test]
async fn test_unexpected_shape_is_a_decode_error() {
    let storage = StorageFile::new();
    let mut t = signed_in(&storage).await;

    let _mock = t
        .server
        .mock("GET", "/api/alerts/active")
        .with_status(200)
        .with_body(r#"{"alerts":[]}"#)
        .create_async()
        .await;

    let err = t.app.alerts.active().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
    assert_eq!(err.category(), ErrorCategory::Decode);
}

#[tokio::test]
async fn test_server_error_message_reaches_caller() {
    let storage = StorageFile::new();
    let mut t = signed_in(&storage).await;

    let _mock = t
        .server
        .mock("DELETE", "/api/locations/9")
        .with_status(400)
        .with_body(r#"{"message":"Location is referenced by alerts"}"#)
        .create_async()
        .await;

    let err = t.app.locations.delete(9).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.user_message("Failed to delete location"),
        "Location is referenced by alerts"
    );
}

#[tokio::test]
async fn test_silent_server_times_out() {
    // Accepts connections and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let mut config = AppConfig::default();
    config.api.base_url = format!("http://{addr}/api");
    config.api.timeout_ms = 200;
    config.storage.path = None;
    let app = FloodSense::with_parts(
        config,
        Arc::new(ReqwestTransport::new()),
        Arc::new(MemoryRouter::default()),
        None,
    )
    .unwrap();

    let err = app.locations.list().await.unwrap_err();
    match &err {
        ClientError::Timeout { url, timeout } => {
            assert!(url.ends_with("/api/locations"));
            assert_eq!(*timeout, Duration::from_millis(200));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Network);

    silent.abort();
}
