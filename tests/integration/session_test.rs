use mockito::Matcher;
use serde_json::json;

use floodsense_lib::auth::{AuthState, GuardDecision, Location, Navigator, UserRecord};
use floodsense_lib::ErrorCategory;

use crate::test_harness::{StorageFile, TestApp};

#[tokio::test]
async fn test_login_authorizes_later_requests() {
    let storage = StorageFile::new();
    let mut t = TestApp::start(&storage).await;

    let verify = t
        .server
        .mock("GET", "/api/admin/verify")
        .expect(0)
        .create_async()
        .await;
    let login = t
        .server
        .mock("POST", "/api/admin/login")
        .match_body(Matcher::Json(json!({"username": "admin", "password": "Admin@123"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token":"t1","user":{"username":"admin"}}"#)
        .create_async()
        .await;
    let locations = t
        .server
        .mock("GET", "/api/locations")
        .match_header("authorization", "Bearer t1")
        .with_status(200)
        .with_body(r#"{"data":[],"count":0}"#)
        .expect(1)
        .create_async()
        .await;

    assert_eq!(t.app.session().initialize().await, AuthState::Anonymous);
    t.app.session().login("admin", "Admin@123").await.unwrap();

    let snapshot = t.app.session().snapshot();
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.user.map(|u| u.username), Some("admin".to_string()));
    assert_eq!(t.app.tokens().get_token().as_deref(), Some("t1"));
    assert_eq!(
        t.app.guard().check(&t.app.session().snapshot(), "/admin/dashboard"),
        GuardDecision::Render
    );

    t.app.locations.list().await.unwrap();

    verify.assert_async().await;
    login.assert_async().await;
    locations.assert_async().await;
}

#[tokio::test]
async fn test_rejected_login_keeps_state() {
    let storage = StorageFile::new();
    let mut t = TestApp::start(&storage).await;

    let _mock = t
        .server
        .mock("POST", "/api/admin/login")
        .with_status(401)
        .with_body(r#"{"error":"Invalid credentials"}"#)
        .create_async()
        .await;

    t.app.session().initialize().await;
    let err = t.app.session().login("admin", "wrong").await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Server);
    assert!(err.user_message("Login failed").contains("Invalid credentials"));
    assert_eq!(t.app.session().state(), AuthState::Anonymous);
    assert!(t.app.tokens().get_token().is_none());
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let storage = StorageFile::new();
    let mut t = TestApp::start(&storage).await;

    let _mock = t
        .server
        .mock("POST", "/api/admin/login")
        .with_status(200)
        .with_body(r#"{"token":"t1","refreshToken":"r1","user":{"id":1,"username":"admin"}}"#)
        .create_async()
        .await;
    let after_logout = t
        .server
        .mock("GET", "/api/subscriptions")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_body(r#"{"error":"No token provided"}"#)
        .create_async()
        .await;

    t.app.session().initialize().await;
    t.app.session().login("admin", "Admin@123").await.unwrap();
    assert_eq!(t.app.tokens().get_refresh_token().as_deref(), Some("r1"));

    t.app.session().logout();

    let service = t.app.session().service();
    assert!(t.app.tokens().get_token().is_none());
    assert!(t.app.tokens().get_user().is_none());
    assert!(t.app.tokens().get_refresh_token().is_none());
    assert!(!service.is_authenticated());
    assert_eq!(t.router.current(), Location::new("/admin/login"));
    assert_eq!(storage.contents(), json!({}));

    let err = t.app.subscriptions.list().await.unwrap_err();
    assert!(err.is_unauthorized());
    after_logout.assert_async().await;
}

#[tokio::test]
async fn test_startup_accepts_verified_token_with_local_user() {
    let storage = StorageFile::new();
    let t = TestApp::start(&storage).await;
    let mut user = UserRecord::new("admin");
    user.role = Some("superadmin".to_string());
    t.app.tokens().save("t1", &user, None).unwrap();

    // A reload: same storage file, new client
    let mut t = TestApp::with_server(t.into_server(), &storage);
    let verify = t
        .server
        .mock("GET", "/api/admin/verify")
        .match_header("authorization", "Bearer t1")
        .with_status(200)
        .with_body(r#"{"valid":true,"user":{"username":"server-side-name"}}"#)
        .create_async()
        .await;

    let state = t.app.session().initialize().await;
    assert_eq!(state, AuthState::Authenticated { user });
    verify.assert_async().await;
}

#[tokio::test]
async fn test_startup_rejected_token_clears_storage() {
    let storage = StorageFile::new();
    storage.seed(json!({
        "floodsense_admin_token": "stale",
        "floodsense_admin_refresh_token": "r0",
        "floodsense_admin_user": r#"{"username":"admin"}"#
    }));
    let mut t = TestApp::start(&storage).await;
    let _mock = t
        .server
        .mock("GET", "/api/admin/verify")
        .with_status(401)
        .with_body(r#"{"error":"Token expired"}"#)
        .create_async()
        .await;

    assert!(t.app.session().snapshot().loading);
    assert_eq!(t.app.session().initialize().await, AuthState::Anonymous);
    assert!(t.app.tokens().get_token().is_none());
    assert!(t.app.tokens().get_user().is_none());
    assert_eq!(storage.contents(), json!({}));
}

#[tokio::test]
async fn test_startup_unconfirmed_token_is_anonymous() {
    let storage = StorageFile::new();
    storage.seed(json!({
        "floodsense_admin_token": "t1",
        "floodsense_admin_user": r#"{"username":"admin"}"#
    }));
    let mut t = TestApp::start(&storage).await;
    let _mock = t
        .server
        .mock("GET", "/api/admin/verify")
        .with_status(200)
        .with_body(r#"{"valid":false}"#)
        .create_async()
        .await;

    assert_eq!(t.app.session().initialize().await, AuthState::Anonymous);
    assert!(t.app.tokens().get_token().is_none());
}

#[tokio::test]
async fn test_startup_without_token_skips_verification() {
    let storage = StorageFile::new();
    let mut t = TestApp::start(&storage).await;
    let verify = t
        .server
        .mock("GET", "/api/admin/verify")
        .expect(0)
        .create_async()
        .await;

    assert_eq!(t.app.session().initialize().await, AuthState::Anonymous);
    verify.assert_async().await;
}

#[tokio::test]
async fn test_protected_route_redirects_and_remembers_origin() {
    let storage = StorageFile::new();
    let mut t = TestApp::start(&storage).await;
    let _mock = t
        .server
        .mock("POST", "/api/admin/login")
        .with_status(200)
        .with_body(r#"{"token":"t1","user":{"username":"admin"}}"#)
        .create_async()
        .await;

    t.app.session().initialize().await;
    t.router.navigate(Location::new("/admin/subscriptions"));
    let decision = t
        .app
        .guard()
        .enforce(t.app.session(), t.router.as_ref(), "/admin/subscriptions");

    assert_eq!(
        decision,
        GuardDecision::Redirect {
            to: "/admin/login".to_string(),
            from: "/admin/subscriptions".to_string(),
        }
    );
    assert_eq!(t.router.current().path, "/admin/login");
    assert_eq!(t.router.current().from.as_deref(), Some("/admin/subscriptions"));

    // The login view sends the user back where they were going
    t.app.session().login("admin", "Admin@123").await.unwrap();
    assert_eq!(t.app.guard().post_login_target(t.router.as_ref()), "/admin/subscriptions");
}

#[tokio::test]
async fn test_malformed_stored_user_reads_as_absent() {
    let storage = StorageFile::new();
    storage.seed(json!({
        "floodsense_admin_token": "t1",
        "floodsense_admin_user": "{not json"
    }));
    let mut t = TestApp::start(&storage).await;
    let verify = t
        .server
        .mock("GET", "/api/admin/verify")
        .expect(0)
        .create_async()
        .await;

    assert!(t.app.session().service().get_current_user().is_none());
    assert_eq!(t.app.session().initialize().await, AuthState::Anonymous);
    verify.assert_async().await;
}

#[tokio::test]
async fn test_corrupt_storage_file_opens_empty() {
    let storage = StorageFile::new();
    if let Some(parent) = storage.path().parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(storage.path(), "this is not json").unwrap();

    let t = TestApp::start(&storage).await;
    assert!(!t.app.tokens().has_token());
    assert_eq!(t.app.session().initialize().await, AuthState::Anonymous);
}
