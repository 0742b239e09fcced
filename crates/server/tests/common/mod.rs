//! Common test utilities for in-process API testing.
//!
//! The fixture builds the real router over a temporary SQLite database with
//! local accounts enabled and a small seeded catalog.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use phonelist_core::{
    create_auth_services, AuthConfig, AuthMethod, CatalogConfig, Config, DatabaseConfig,
    NoticeHandle, ProfileService, ServerConfig, SqliteStore,
};
use phonelist_server::state::AppState;

/// Re-export fixtures for test convenience
pub use phonelist_core::testing::fixtures;

/// In-process server over a temporary database.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_profile() {
///     let fixture = TestFixture::new().await;
///     let token = fixture.register("ada@example.com").await;
///
///     let response = fixture.get_as("/api/v1/me", &token).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<SqliteStore>,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Local accounts, seeded catalog.
    pub async fn new() -> Self {
        Self::with_auth(AuthMethod::Local).await
    }

    pub async fn with_auth(method: AuthMethod) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            auth: AuthConfig {
                method,
                session_ttl_hours: 1,
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            catalog: CatalogConfig::default(),
        };

        let store = Arc::new(SqliteStore::new(&db_path).expect("Failed to open store"));
        store
            .replace_catalog(&fixtures::sample_phones())
            .expect("Failed to seed catalog");

        let auth = create_auth_services(&config.auth, &config.database)
            .expect("Failed to create auth services");
        let notices = NoticeHandle::detached();
        let profiles =
            ProfileService::new(store.clone(), auth.identity_provider.clone(), notices.clone());

        let state = Arc::new(AppState::new(
            config,
            auth.authenticator,
            store.clone(),
            profiles,
            notices,
        ));
        let router = phonelist_server::api::create_router(state);

        Self {
            router,
            store,
            temp_dir,
        }
    }

    /// Register an account and return its bearer token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .post(
                "/api/v1/auth/register",
                json!({ "email": email, "password": "password", "display_name": email }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "register failed: {}", response.body);
        response.body["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    pub async fn get_as(&self, path: &str, token: &str) -> TestResponse {
        self.request("GET", path, None, Some(token)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    pub async fn post_as(&self, path: &str, body: Value, token: &str) -> TestResponse {
        self.request("POST", path, Some(body), Some(token)).await
    }

    pub async fn patch_as(&self, path: &str, body: Value, token: &str) -> TestResponse {
        self.request("PATCH", path, Some(body), Some(token)).await
    }

    pub async fn put_as(&self, path: &str, token: &str) -> TestResponse {
        self.request("PUT", path, None, Some(token)).await
    }

    pub async fn delete_as(&self, path: &str, token: &str) -> TestResponse {
        self.request("DELETE", path, None, Some(token)).await
    }

    /// Raw text body (for `/metrics`).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Ids of a JSON array of catalog items or reviews.
pub fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
