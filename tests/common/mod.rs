//! Test helpers for Web API integration tests.
//!
//! Provides an in-process [`TestServer`] over an in-memory database and a temporary
//! blob directory, plus request helpers shared by the `web_api_*` suites.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

use cloudrive::web::handlers::AppState;
use cloudrive::web::middleware::JwtState;
use cloudrive::web::router::create_router;
use cloudrive::{Config, Database};

/// Default password used by registered test users.
pub const PASSWORD: &str = "password123";

/// A running test application.
pub struct TestApp {
    /// In-process server.
    pub server: TestServer,
    /// Backing database.
    pub db: Database,
    /// Blob directory, removed on drop.
    _blobs: TempDir,
}

/// An authenticated test user.
pub struct TestUser {
    /// User ID.
    pub id: Uuid,
    /// Bearer token.
    pub token: String,
}

impl TestUser {
    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Create a test configuration.
pub fn create_test_config(blobs: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.auth.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.auth.access_token_expiry_secs = 900;
    config.storage.path = blobs.path().to_string_lossy().into_owned();
    config.storage.max_upload_size_mb = 1;
    config
}

/// Create a test server with an in-memory database.
pub async fn create_test_app() -> TestApp {
    let blobs = TempDir::new().expect("Failed to create blob directory");
    let config = create_test_config(&blobs);

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let app_state = Arc::new(AppState::new(&config, &db).expect("Failed to create app state"));
    let jwt_state = Arc::new(JwtState::new(&config.auth.jwt_secret));

    let router = create_router(app_state, jwt_state, &config.server.cors_origins);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        _blobs: blobs,
    }
}

/// Register a user and log them in.
pub async fn register_and_login(server: &TestServer, email: &str) -> TestUser {
    server
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    TestUser {
        id: body["data"]["user"]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap(),
        token: body["data"]["access_token"].as_str().unwrap().to_string(),
    }
}

/// Upload a file, returning the raw response.
pub async fn try_upload(
    server: &TestServer,
    user: &TestUser,
    name: &str,
    content: &[u8],
    folder_id: Option<Uuid>,
) -> TestResponse {
    let mut form = MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec()).file_name(name.to_string()),
    );
    if let Some(folder_id) = folder_id {
        form = form.add_text("folder_id", folder_id.to_string());
    }

    server
        .post("/api/files")
        .add_header(AUTHORIZATION, user.bearer())
        .multipart(form)
        .await
}

/// Upload a file and return its ID.
pub async fn upload(
    server: &TestServer,
    user: &TestUser,
    name: &str,
    content: &[u8],
    folder_id: Option<Uuid>,
) -> Uuid {
    let response = try_upload(server, user, name, content, folder_id).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    id_of(&response.json())
}

/// Create a folder and return its ID.
pub async fn create_folder(
    server: &TestServer,
    user: &TestUser,
    name: &str,
    parent_folder_id: Option<Uuid>,
) -> Uuid {
    let response = server
        .post("/api/folders")
        .add_header(AUTHORIZATION, user.bearer())
        .json(&json!({ "name": name, "parent_folder_id": parent_folder_id }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    id_of(&response.json())
}

/// Grant `role` on a file or folder, returning the raw response.
pub async fn grant(
    server: &TestServer,
    owner: &TestUser,
    grantee: &TestUser,
    target: Value,
    role: &str,
) -> TestResponse {
    let mut body = target;
    body["target_user_id"] = json!(grantee.id);
    body["role"] = json!(role);

    server
        .post("/api/permissions")
        .add_header(AUTHORIZATION, owner.bearer())
        .json(&body)
        .await
}

/// `data.id` of a response body.
pub fn id_of(body: &Value) -> Uuid {
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

/// Assert the uniform not-found-or-no-access body.
pub fn assert_not_found_or_no_access(response: &TestResponse) {
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "not found or no access");
}
