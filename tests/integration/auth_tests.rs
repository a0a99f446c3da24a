//! Authentication integration tests.
//!
//! Tests verify:
//! - Registration (success, duplicates, validation envelopes)
//! - Login (success, uniform failure)
//! - Bearer token handling on protected routes

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use chrono::Duration;
use serde_json::{json, Value};
use uuid::Uuid;

use photo_browser::server::{Identity, TokenAuth};
use photo_browser::store::Store;

use super::test_utils::{empty_request, json_request, TestApp, TEST_SECRET};

fn registration(username: &str, email: &str) -> Value {
    json!({
        "name": "Test User",
        "email": email,
        "username": username,
        "password": "password123",
    })
}

fn fields(body: &Value) -> Vec<&str> {
    body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_returns_token_for_new_user() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            registration("leanne", "leanne@example.com"),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["username"], "leanne");
    assert_eq!(body["user"]["email"], "leanne@example.com");
    assert!(body["user"].get("password").is_none());

    let identity = TokenAuth::new(TEST_SECRET)
        .verify(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(identity.user_id.to_string(), body["user"]["id"]);
    assert_eq!(identity.email, "leanne@example.com");

    let stored = app
        .store
        .find_user_by_email("leanne@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, identity.user_id);
    assert!(stored.password_hash.starts_with("$argon2"));
    assert_ne!(stored.password_hash, "password123");
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new();
    app.register("first").await;

    let (status, body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            registration("second", "first@example.com"),
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"error": "email already exists"}));
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let app = TestApp::new();
    app.register("taken").await;

    let (status, body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            registration("taken", "someone-else@example.com"),
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "username already exists");
}

#[tokio::test]
async fn test_register_reports_every_violation() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "name": "A",
                "email": "not-an-email",
                "username": "bad name!",
                "password": "123",
                "website": "nope",
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(
        fields(&body),
        vec!["name", "email", "username", "password", "website"]
    );
}

#[tokio::test]
async fn test_register_reports_partial_address_with_other_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "name": "L",
                "email": "bad",
                "username": "kulas",
                "password": "password123",
                "address": {"street": "Kulas Light"},
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(
        fields(&body),
        vec!["name", "email", "address.suite", "address.city", "address.zipcode"]
    );
    assert_eq!(body["details"][2]["message"], "Suite is required");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(json_request(Method::POST, "/api/auth/register", None, json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields(&body), vec!["name", "email", "username", "password"]);
    assert_eq!(body["details"][0]["message"], "Name is required");
}

#[tokio::test]
async fn test_register_malformed_json() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = app.send_json(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(fields(&body), vec!["body"]);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    let (_, id) = app.register("login").await;

    let (status, body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "login@example.com", "password": "password123"}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["id"], id);

    let identity = TokenAuth::new(TEST_SECRET)
        .verify(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(identity.user_id.to_string(), id);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("victim").await;

    let (wrong_status, wrong_body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "victim@example.com", "password": "wrong-password"}),
        ))
        .await;
    let (unknown_status, unknown_body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "nobody@example.com", "password": "password123"}),
        ))
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, json!({"error": "Invalid credentials"}));
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_login_validation() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "bad", "password": ""}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields(&body), vec!["email", "password"]);
}

// =============================================================================
// Bearer tokens
// =============================================================================

#[tokio::test]
async fn test_me_returns_profile() {
    let app = TestApp::new();
    let (token, id) = app.register("meuser").await;

    let (status, body) = app
        .send_json(empty_request(Method::GET, "/api/auth/me", Some(&token)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id);
    assert_eq!(body["user"]["email"], "meuser@example.com");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_missing_token() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(empty_request(Method::GET, "/api/auth/me", None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "No token provided"}));
}

#[tokio::test]
async fn test_wrong_scheme_is_missing_token() {
    let app = TestApp::new();
    let (token, _) = app.register("scheme").await;

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Token {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_json(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided");
}

#[tokio::test]
async fn test_invalid_token() {
    let app = TestApp::new();

    let forged = TokenAuth::new("some-other-secret")
        .issue(&Identity {
            user_id: Uuid::new_v4(),
            email: "x@example.com".to_string(),
        })
        .unwrap();

    for token in ["garbage", forged.as_str()] {
        let (status, body) = app
            .send_json(empty_request(Method::GET, "/api/auth/me", Some(token)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
    }
}

#[tokio::test]
async fn test_expired_token() {
    let app = TestApp::new();

    let expired = TokenAuth::new(TEST_SECRET)
        .with_ttl(Duration::seconds(-60))
        .issue(&Identity {
            user_id: Uuid::new_v4(),
            email: "old@example.com".to_string(),
        })
        .unwrap();

    let (status, body) = app
        .send_json(empty_request(Method::GET, "/api/auth/me", Some(&expired)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token expired");
}

#[tokio::test]
async fn test_me_for_deleted_user() {
    let app = TestApp::new();

    let token = TokenAuth::new(TEST_SECRET)
        .issue(&Identity {
            user_id: Uuid::new_v4(),
            email: "ghost@example.com".to_string(),
        })
        .unwrap();

    let (status, body) = app
        .send_json(empty_request(Method::GET, "/api/auth/me", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    let requests = [
        json_request(Method::POST, "/api/albums", None, json!({"title": "x"})),
        json_request(Method::PUT, "/api/albums/1", None, json!({"title": "x"})),
        empty_request(Method::DELETE, "/api/albums/1", None),
        json_request(Method::PUT, "/api/photos/1", None, json!({"title": "x"})),
        empty_request(Method::DELETE, "/api/photos/1", None),
    ];

    for request in requests {
        let uri = request.uri().clone();
        let (status, _) = app.send_json(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}
