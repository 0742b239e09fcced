//! End-to-end API tests against the in-process router.

mod common;

use axum::http::StatusCode;
use common::{ids, TestFixture};
use phonelist_core::AuthMethod;
use serde_json::json;

// =============================================================================
// Health, config, metrics
// =============================================================================

#[tokio::test]
async fn test_health_and_config() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["auth"]["method"], "local");
    assert!(!response.body.to_string().contains("test.db"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/catalog").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("phonelist_http_requests_total"));
    assert!(body.contains("phonelist_catalog_items"));
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_unfiltered_keeps_order() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/catalog").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 3);
    assert_eq!(ids(&response.body["items"]), vec!["galaxy", "pixel", "iphone"]);
}

#[tokio::test]
async fn test_catalog_filters() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/catalog?query=PIX").await;
    assert_eq!(ids(&response.body["items"]), vec!["pixel"]);

    let response = fixture.get("/api/v1/catalog?battery_min=4500").await;
    assert_eq!(ids(&response.body["items"]), vec!["galaxy", "pixel"]);

    let response = fixture.get("/api/v1/catalog?year=2023").await;
    assert_eq!(ids(&response.body["items"]), vec!["pixel", "iphone"]);

    let response = fixture.get("/api/v1/catalog?os=ios").await;
    assert_eq!(ids(&response.body["items"]), vec!["iphone"]);

    let response = fixture
        .get("/api/v1/catalog?ram_min=8&camera_mp_min=100")
        .await;
    assert_eq!(ids(&response.body["items"]), vec!["galaxy"]);

    let response = fixture.get("/api/v1/catalog?screen_size_min=6.5&query=pixel").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 0);
}

#[tokio::test]
async fn test_catalog_bad_filter_is_json_error() {
    let fixture = TestFixture::new().await;

    for path in [
        "/api/v1/catalog?year=",
        "/api/v1/catalog?battery_min=",
        "/api/v1/catalog?ram_min=lots",
    ] {
        let response = fixture.get(path).await;
        assert_status!(response, StatusCode::BAD_REQUEST);
        assert!(response.body["error"].is_string(), "{}: {}", path, response.body);
    }

    // An empty text filter is no constraint.
    let response = fixture.get("/api/v1/catalog?os=").await;
    assert_eq!(response.body["total"], 3);
}

#[tokio::test]
async fn test_catalog_facets() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/catalog/facets").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["years"], json!([2024, 2023]));
    assert_eq!(response.body["ram_sizes"], json!([6, 8, 12]));
    assert_eq!(response.body["os_names"], json!(["Android 14", "iOS 17"]));
}

#[tokio::test]
async fn test_catalog_item() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/catalog/pixel").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["name"], "Pixel 8");

    let response = fixture.get("/api/v1/catalog/nokia").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("nokia"));
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_register_sign_in_sign_out() {
    let fixture = TestFixture::new().await;
    let token = fixture.register("ada@example.com").await;

    let response = fixture
        .post(
            "/api/v1/auth/register",
            json!({ "email": "ADA@example.com", "password": "other" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);

    let response = fixture
        .post(
            "/api/v1/auth/sign-in",
            json!({ "email": "ada@example.com", "password": "wrong" }),
        )
        .await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = fixture
        .post(
            "/api/v1/auth/sign-in",
            json!({ "email": "ada@example.com", "password": "password" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    let second = response.body["token"].as_str().unwrap().to_string();

    let response = fixture
        .post_as("/api/v1/auth/sign-out", json!({}), &token)
        .await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = fixture.get_as("/api/v1/me", &token).await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = fixture.get_as("/api/v1/me", &second).await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/auth/register", json!({ "email": "ada@example.com" }))
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].as_str().unwrap().contains("password"));

    let token = fixture.register("ada@example.com").await;
    let response = fixture
        .post_as("/api/v1/catalog/pixel/reviews", json!({ "comment": 5 }), &token)
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_guest_mutations_require_sign_in() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/me").await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = fixture
        .post("/api/v1/catalog/pixel/reviews", json!({ "comment": "hi", "rating": 5 }))
        .await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = fixture.get_as("/api/v1/me/favorites", "not-a-token").await;
    assert_status!(response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_accounts_disabled() {
    let fixture = TestFixture::with_auth(AuthMethod::None).await;

    let response = fixture
        .post(
            "/api/v1/auth/register",
            json!({ "email": "ada@example.com", "password": "password" }),
        )
        .await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);

    // Browsing still works for guests.
    let response = fixture.get("/api/v1/catalog").await;
    assert_status!(response, StatusCode::OK);
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_profile_lifecycle() {
    let fixture = TestFixture::new().await;
    let token = fixture.register("ada@example.com").await;

    let response = fixture.get_as("/api/v1/me", &token).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["email"], "ada@example.com");
    assert_eq!(response.body["favorites"], json!([]));

    let response = fixture
        .patch_as(
            "/api/v1/me",
            json!({ "name": "Ada Lovelace", "description": "Engines" }),
            &token,
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["name"], "Ada Lovelace");
    assert_eq!(response.body["description"], "Engines");

    let response = fixture.patch_as("/api/v1/me", json!({}), &token).await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = fixture.delete_as("/api/v1/me", &token).await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = fixture.get_as("/api/v1/me", &token).await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = fixture
        .post(
            "/api/v1/auth/sign-in",
            json!({ "email": "ada@example.com", "password": "password" }),
        )
        .await;
    assert_status!(response, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Favorites
// =============================================================================

#[tokio::test]
async fn test_favorites_join_in_catalog_order() {
    let fixture = TestFixture::new().await;
    let token = fixture.register("ada@example.com").await;

    for id in ["iphone", "galaxy"] {
        let response = fixture
            .put_as(&format!("/api/v1/me/favorites/{}", id), &token)
            .await;
        assert_status!(response, StatusCode::NO_CONTENT);
    }

    let response = fixture.get_as("/api/v1/me/favorites", &token).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(ids(&response.body), vec!["galaxy", "iphone"]);

    let response = fixture.get_as("/api/v1/me", &token).await;
    assert_eq!(response.body["favorites"], json!(["galaxy", "iphone"]));
}

#[tokio::test]
async fn test_favorite_add_then_remove_restores_set() {
    let fixture = TestFixture::new().await;
    let token = fixture.register("ada@example.com").await;
    fixture.put_as("/api/v1/me/favorites/galaxy", &token).await;

    fixture.put_as("/api/v1/me/favorites/pixel", &token).await;
    let response = fixture
        .delete_as("/api/v1/me/favorites/pixel", &token)
        .await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = fixture.get_as("/api/v1/me/favorites", &token).await;
    assert_eq!(ids(&response.body), vec!["galaxy"]);
}

#[tokio::test]
async fn test_favorite_unknown_item() {
    let fixture = TestFixture::new().await;
    let token = fixture.register("ada@example.com").await;

    let response = fixture.put_as("/api/v1/me/favorites/nokia", &token).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn test_review_submit_is_upsert_per_author() {
    let fixture = TestFixture::new().await;
    let ada = fixture.register("ada@example.com").await;
    let bob = fixture.register("bob@example.com").await;

    let first = fixture
        .post_as(
            "/api/v1/catalog/pixel/reviews",
            json!({ "comment": "Great", "rating": 5 }),
            &ada,
        )
        .await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(first.body["user_name"], "ada@example.com");

    fixture
        .post_as(
            "/api/v1/catalog/pixel/reviews",
            json!({ "comment": "Fine", "rating": 3 }),
            &bob,
        )
        .await;

    // Keep the edit's timestamp strictly after bob's review.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = fixture
        .post_as(
            "/api/v1/catalog/pixel/reviews",
            json!({ "comment": "Actually good", "rating": 4 }),
            &ada,
        )
        .await;
    assert_status!(second, StatusCode::OK);
    assert_eq!(second.body["id"], first.body["id"]);

    let response = fixture.get("/api/v1/catalog/pixel/reviews").await;
    assert_status!(response, StatusCode::OK);
    let reviews = response.body.as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    let own = reviews
        .iter()
        .find(|r| r["id"] == first.body["id"])
        .unwrap();
    assert_eq!(own["comment"], "Actually good");
    assert_eq!(own["rating"], 4);

    // Edited review moved after bob's.
    assert_eq!(reviews[1]["id"], first.body["id"]);
}

#[tokio::test]
async fn test_review_delete_by_author_only() {
    let fixture = TestFixture::new().await;
    let ada = fixture.register("ada@example.com").await;
    let bob = fixture.register("bob@example.com").await;

    let review = fixture
        .post_as(
            "/api/v1/catalog/galaxy/reviews",
            json!({ "comment": "Huge", "rating": 4 }),
            &ada,
        )
        .await;
    let path = format!("/api/v1/reviews/{}", review.body["id"].as_str().unwrap());

    let response = fixture.delete_as(&path, &bob).await;
    assert_status!(response, StatusCode::FORBIDDEN);

    let response = fixture.delete_as(&path, &ada).await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = fixture.get("/api/v1/catalog/galaxy/reviews").await;
    assert_eq!(response.body, json!([]));

    let response = fixture.delete_as(&path, &ada).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}
