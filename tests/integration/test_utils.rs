//! Test utilities for integration tests.
//!
//! This module provides a mock asset storage, a router wired to an in-memory
//! store, and helpers for building requests (JSON and multipart) and reading
//! responses.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

use photo_browser::config::Environment;
use photo_browser::error::StorageError;
use photo_browser::media::{asset_key, AssetStorage, StoredAsset};
use photo_browser::server::{create_router, AppState, RateLimiters, RouterConfig, TokenAuth};
use photo_browser::store::MemoryStore;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const CLIENT_URL: &str = "http://localhost:3000";
pub const ASSET_BASE_URL: &str = "https://assets.example.com";

// =============================================================================
// Mock Asset Storage
// =============================================================================

/// In-memory asset storage with switchable failures.
#[derive(Default)]
pub struct MockAssetStorage {
    objects: RwLock<HashMap<String, Bytes>>,
    put_count: AtomicUsize,
    delete_count: AtomicUsize,
    fail_folder: Option<String>,
    fail_deletes: AtomicBool,
}

impl MockAssetStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every upload into `folder`.
    pub fn failing_uploads_to(folder: &str) -> Self {
        Self {
            fail_folder: Some(folder.to_string()),
            ..Self::default()
        }
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).cloned()
    }

    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStorage for MockAssetStorage {
    async fn put(
        &self,
        folder: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<StoredAsset, StorageError> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_folder.as_deref() == Some(folder) {
            return Err(StorageError::Upload(format!("mock upload to {} refused", folder)));
        }

        let key = asset_key(folder);
        self.objects.write().await.insert(key.clone(), data);
        Ok(StoredAsset {
            url: format!("{}/{}", ASSET_BASE_URL, key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete(format!("mock delete of {} refused", key)));
        }
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }
}

// =============================================================================
// Test Application
// =============================================================================

/// A router over fresh in-memory state.
///
/// Rate limiters trust `X-Forwarded-For`, so helpers can act as distinct
/// clients; requests without the header all count as one client.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MockAssetStorage>,
    client_counter: AtomicUsize,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_options(MockAssetStorage::new(), Environment::Production)
    }

    pub fn with_storage(storage: MockAssetStorage) -> Self {
        Self::with_options(storage, Environment::Production)
    }

    pub fn with_options(storage: MockAssetStorage, environment: Environment) -> Self {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(storage);
        let state = AppState::new(store.clone(), storage.clone(), TokenAuth::new(TEST_SECRET));

        let config = RouterConfig::new(vec![CLIENT_URL.to_string()])
            .with_environment(environment)
            .with_tracing(false)
            .with_rate_limiters(RateLimiters::new(true));

        Self {
            router: create_router(state, config),
            store,
            storage,
            client_counter: AtomicUsize::new(0),
        }
    }

    /// Send one request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request and decode the JSON response.
    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// A client address no other helper call has used.
    fn fresh_client(&self) -> String {
        let n = self.client_counter.fetch_add(1, Ordering::SeqCst);
        format!("10.1.{}.{}", n / 250, n % 250 + 1)
    }

    /// Register `username` (email `<username>@example.com`, password
    /// `password123`) and return its token and id.
    pub async fn register(&self, username: &str) -> (String, String) {
        let mut request = json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "name": format!("User {}", username),
                "email": format!("{}@example.com", username),
                "username": username,
                "password": "password123",
            }),
        );
        request
            .headers_mut()
            .insert("x-forwarded-for", self.fresh_client().parse().unwrap());

        let (status, body) = self.send_json(request).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Create an album and return its id.
    pub async fn create_album(&self, token: &str, title: &str) -> u64 {
        let (status, body) = self
            .send_json(json_request(
                Method::POST,
                "/api/albums",
                Some(token),
                json!({ "title": title }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create album failed: {}", body);
        body["album"]["id"].as_u64().unwrap()
    }

    /// Upload a small PNG into `album_id` as a fresh client and return the
    /// response.
    pub async fn upload_photo(&self, token: &str, album_id: u64, title: &str) -> (StatusCode, Value) {
        let form = MultipartForm::new()
            .text("title", title)
            .text("albumId", &album_id.to_string())
            .file("image", "photo.png", "image/png", &png_bytes(320, 240));
        let mut request = form.into_request("/api/photos", Some(token));
        request
            .headers_mut()
            .insert("x-forwarded-for", self.fresh_client().parse().unwrap());
        self.send_json(request).await
    }

    /// Upload a photo that must succeed and return its id.
    pub async fn create_photo(&self, token: &str, album_id: u64, title: &str) -> u64 {
        let (status, body) = self.upload_photo(token, album_id, title).await;
        assert_eq!(status, StatusCode::CREATED, "upload failed: {}", body);
        body["photo"]["id"].as_u64().unwrap()
    }
}

// =============================================================================
// Request Builders
// =============================================================================

/// A GET request without credentials.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// A request without a body, optionally carrying a bearer token.
pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// A JSON request, optionally carrying a bearer token.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

/// `multipart/form-data` body builder.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: "photo-browser-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Images
// =============================================================================

/// Encode a gradient PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Check if data starts with a JPEG SOI marker.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}
