//! HTTP request handlers for the photo browser API.
//!
//! # Endpoints
//!
//! - `POST /api/auth/register`, `POST /api/auth/login`, `GET /api/auth/me` - [`auth`]
//! - `/api/albums` - [`albums`]
//! - `/api/photos` - [`photos`]
//! - `GET /api/users/{id}` - [`users`]
//! - `GET /health` - Health check endpoint

pub mod albums;
pub mod auth;
pub mod photos;
pub mod users;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::FromRef, Json};
use serde::Serialize;
use uuid::Uuid;

use super::auth::TokenAuth;
use crate::error::{ApiError, ApiResult};
use crate::media::{AssetStorage, ImageProcessor};
use crate::model::{Album, AlbumView, Photo, PhotoView, User};
use crate::store::Store;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Users, albums and photos
    pub store: Arc<dyn Store>,

    /// Remote storage for uploaded images
    pub storage: Arc<dyn AssetStorage>,

    /// Token issuer/verifier
    pub auth: TokenAuth,

    /// Resizer for uploaded images
    pub processor: ImageProcessor,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, storage: Arc<dyn AssetStorage>, auth: TokenAuth) -> Self {
        Self {
            store,
            storage,
            auth,
            processor: ImageProcessor::new(),
        }
    }
}

impl FromRef<AppState> for TokenAuth {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Body of responses that only carry a confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Health check endpoint.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Photo Browser API is running".to_string(),
    })
}

// =============================================================================
// View assembly
// =============================================================================

/// Builds public views, looking up each owner and album at most once.
pub(crate) struct Views<'a> {
    store: &'a dyn Store,
    users: HashMap<Uuid, Option<User>>,
    albums: HashMap<u64, Option<Album>>,
}

impl<'a> Views<'a> {
    pub(crate) fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            users: HashMap::new(),
            albums: HashMap::new(),
        }
    }

    async fn user(&mut self, id: Uuid) -> ApiResult<Option<&User>> {
        if !self.users.contains_key(&id) {
            let user = self.store.find_user(id).await?;
            self.users.insert(id, user);
        }
        Ok(self.users.get(&id).and_then(Option::as_ref))
    }

    async fn album(&mut self, id: u64) -> ApiResult<Option<&Album>> {
        if !self.albums.contains_key(&id) {
            let album = self.store.find_album(id).await?;
            self.albums.insert(id, album);
        }
        Ok(self.albums.get(&id).and_then(Option::as_ref))
    }

    pub(crate) async fn album_view(&mut self, album: &Album) -> ApiResult<AlbumView> {
        let owner = self.user(album.user_id).await?.cloned();
        Ok(AlbumView::new(album, owner.as_ref()))
    }

    pub(crate) async fn photo_view(&mut self, photo: &Photo) -> ApiResult<PhotoView> {
        let owner = self.user(photo.user_id).await?.cloned();
        let album = self.album(photo.album_id).await?.cloned();
        Ok(PhotoView::new(photo, album.as_ref(), owner.as_ref()))
    }

    pub(crate) async fn album_views(&mut self, albums: &[Album]) -> ApiResult<Vec<AlbumView>> {
        let mut views = Vec::with_capacity(albums.len());
        for album in albums {
            views.push(self.album_view(album).await?);
        }
        Ok(views)
    }

    pub(crate) async fn photo_views(&mut self, photos: &[Photo]) -> ApiResult<Vec<PhotoView>> {
        let mut views = Vec::with_capacity(photos.len());
        for photo in photos {
            views.push(self.photo_view(photo).await?);
        }
        Ok(views)
    }
}

/// Run a CPU-bound closure on the blocking pool.
pub(crate) async fn blocking<T, F>(task: &'static str, f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("{} task failed: {}", task, e)))?
}
