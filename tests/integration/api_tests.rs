//! API integration tests for the pipeline shared by every endpoint.
//!
//! Tests verify:
//! - Health check and unmatched routes
//! - Security headers and CORS
//! - Public user profiles
//! - Internal error bodies per environment

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use serde_json::json;

use photo_browser::config::Environment;
use photo_browser::media::THUMBNAIL_FOLDER;

use super::test_utils::{
    body_json, get, json_request, MockAssetStorage, TestApp, CLIENT_URL,
};

// =============================================================================
// Health and fallback
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();

    let (status, body) = app.send_json(get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "OK", "message": "Photo Browser API is running"})
    );
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = TestApp::new();

    let (status, body) = app.send_json(get("/api/nothing-here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Route not found"}));

    let (status, _) = app.send_json(get("/favicon.ico")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unsupported_method_returns_404_json() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::PATCH, "/api/albums/1"),
        (Method::DELETE, "/api/albums"),
        (Method::POST, "/health"),
    ] {
        let response = app
            .send(json_request(method.clone(), uri, None, json!({})))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_json(response).await, json!({"error": "Route not found"}));
    }
}

// =============================================================================
// Security headers and CORS
// =============================================================================

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = TestApp::new();

    for uri in ["/health", "/api/albums", "/does-not-exist"] {
        let response = app.send(get(uri)).await;
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff", "{}", uri);
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN", "{}", uri);
        assert_eq!(headers["referrer-policy"], "no-referrer", "{}", uri);
        assert_eq!(
            headers["strict-transport-security"],
            "max-age=15552000; includeSubDomains",
            "{}",
            uri
        );
        assert_eq!(headers["cross-origin-opener-policy"], "same-origin", "{}", uri);
    }
}

#[tokio::test]
async fn test_cors_preflight_allows_client_origin() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/albums")
        .header(header::ORIGIN, CLIENT_URL)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], CLIENT_URL);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_rejects_other_origins() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_get_user_profile_excludes_password() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "name": "Leanne Graham",
                "email": "sincere@april.biz",
                "username": "Bret",
                "password": "secret123",
                "phone": "1-770-736-8031",
                "website": "https://hildegard.org",
                "address": {
                    "street": "Kulas Light",
                    "suite": "Apt. 556",
                    "city": "Gwenborough",
                    "zipcode": "92998-3874"
                },
                "company": {
                    "name": "Romaguera-Crona",
                    "catchPhrase": "Multi-layered client-server neural-net",
                    "bs": "harness real-time e-markets"
                }
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["user"]["id"].as_str().unwrap().to_string();

    let (status, profile) = app.send_json(get(&format!("/api/users/{}", id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], id);
    assert_eq!(profile["username"], "Bret");
    assert_eq!(profile["phone"], "1-770-736-8031");
    assert_eq!(profile["address"]["city"], "Gwenborough");
    assert_eq!(profile["company"]["catchPhrase"], "Multi-layered client-server neural-net");
    assert!(profile["createdAt"].is_string());
    assert!(profile["updatedAt"].is_string());

    let object = profile.as_object().unwrap();
    assert!(!object.keys().any(|k| k.to_lowercase().contains("password")));
}

#[tokio::test]
async fn test_get_unknown_user() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(get("/api/users/7f1f4f65-5b2d-4a57-9a8e-0f2b6c1f9d11"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_get_user_with_malformed_id() {
    let app = TestApp::new();

    let (status, body) = app.send_json(get("/api/users/not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid ID format"}));
}

// =============================================================================
// Internal errors
// =============================================================================

#[tokio::test]
async fn test_internal_error_hidden_in_production() {
    let app = TestApp::with_storage(MockAssetStorage::failing_uploads_to(THUMBNAIL_FOLDER));
    let (token, _) = app.register("prod").await;
    let album_id = app.create_album(&token, "Album").await;

    let (status, body) = app.upload_photo(&token, album_id, "Photo").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
    assert!(body.get("stack").is_none());
}

#[tokio::test]
async fn test_internal_error_detail_in_development() {
    let app = TestApp::with_options(
        MockAssetStorage::failing_uploads_to(THUMBNAIL_FOLDER),
        Environment::Development,
    );
    let (token, _) = app.register("dev").await;
    let album_id = app.create_album(&token, "Album").await;

    let (status, body) = app.upload_photo(&token, album_id, "Photo").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("mock upload to photo-browser/thumbnails refused"));
    let stack = body["stack"].as_array().unwrap();
    assert!(stack[0].as_str().unwrap().starts_with("Storage(Upload("), "{:?}", stack);
}

#[tokio::test]
async fn test_error_responses_are_json() {
    let app = TestApp::new();

    let response = app.send(get("/api/albums/999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_json(response).await, json!({"error": "Album not found"}));
}
