//! Album handlers.
//!
//! Reads are public. Create, update and delete require a bearer token, and
//! update and delete are further limited to the album's owner.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::{AppState, MessageResponse, Views};
use crate::error::{ApiError, ApiResult};
use crate::model::{Album, AlbumView, PhotoView};
use crate::server::auth::AuthUser;
use crate::store::{create_album as insert_next_album, ListQuery, Pagination};
use crate::validation::{
    AlbumListParams, CreateAlbumRequest, PageParams, ResourceId, UpdateAlbumRequest,
    ValidatedJson, ValidatedQuery,
};

#[derive(Debug, Serialize)]
pub struct AlbumListResponse {
    pub albums: Vec<AlbumView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct AlbumResponse {
    pub message: &'static str,
    pub album: AlbumView,
}

/// `GET /api/albums`
pub async fn list_albums(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<AlbumListParams>,
) -> ApiResult<Json<AlbumListResponse>> {
    let listing = state.store.list_albums(&query).await?;
    let albums = Views::new(state.store.as_ref())
        .album_views(&listing.items)
        .await?;

    Ok(Json(AlbumListResponse {
        albums,
        pagination: Pagination::new(query.page, listing.total),
    }))
}

/// `GET /api/albums/{id}`
pub async fn get_album(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<AlbumView>> {
    let album = find_album(&state, id).await?;
    let view = Views::new(state.store.as_ref()).album_view(&album).await?;
    Ok(Json(view))
}

/// `GET /api/albums/{albumId}/photos`
///
/// Returns a bare array of photos, not a paginated envelope.
pub async fn list_album_photos(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> ApiResult<Json<Vec<PhotoView>>> {
    let album = find_album(&state, id).await?;

    let query = ListQuery {
        album_id: Some(album.id),
        ..ListQuery::page(page)
    };
    let listing = state.store.list_photos(&query).await?;
    let photos = Views::new(state.store.as_ref())
        .photo_views(&listing.items)
        .await?;

    Ok(Json(photos))
}

/// `POST /api/albums`
pub async fn create_album(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(title): ValidatedJson<CreateAlbumRequest>,
) -> ApiResult<(StatusCode, Json<AlbumResponse>)> {
    let now = Utc::now();
    let album = insert_next_album(
        state.store.as_ref(),
        Album {
            id: 0,
            title,
            user_id: caller.user_id,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    info!(album_id = album.id, user_id = %caller.user_id, "Created album");
    let view = Views::new(state.store.as_ref()).album_view(&album).await?;

    Ok((
        StatusCode::CREATED,
        Json(AlbumResponse {
            message: "Album created successfully",
            album: view,
        }),
    ))
}

/// `PUT /api/albums/{id}`
pub async fn update_album(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ResourceId(id): ResourceId,
    ValidatedJson(changes): ValidatedJson<UpdateAlbumRequest>,
) -> ApiResult<Json<AlbumResponse>> {
    let mut album = find_album(&state, id).await?;
    if !album.is_owned_by(caller.user_id) {
        return Err(ApiError::Forbidden(
            "You can only update your own albums".to_string(),
        ));
    }

    if let Some(title) = changes.title {
        album.title = title;
        album.updated_at = Utc::now();
    }

    let album = state
        .store
        .update_album(album)
        .await?
        .ok_or_else(album_not_found)?;
    let view = Views::new(state.store.as_ref()).album_view(&album).await?;

    Ok(Json(AlbumResponse {
        message: "Album updated successfully",
        album: view,
    }))
}

/// `DELETE /api/albums/{id}`
///
/// Refused while the album still holds photos.
pub async fn delete_album(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<MessageResponse>> {
    let album = find_album(&state, id).await?;
    if !album.is_owned_by(caller.user_id) {
        return Err(ApiError::Forbidden(
            "You can only delete your own albums".to_string(),
        ));
    }

    let photo_count = state.store.count_photos_in_album(album.id).await?;
    if photo_count > 0 {
        return Err(ApiError::BadRequest(format!(
            "Cannot delete album. It contains {} photo(s). Please delete or move the photos first.",
            photo_count
        )));
    }

    if !state.store.delete_album(album.id).await? {
        return Err(album_not_found());
    }
    info!(album_id = album.id, "Deleted album");

    Ok(Json(MessageResponse {
        message: "Album deleted successfully",
    }))
}

fn album_not_found() -> ApiError {
    ApiError::NotFound("Album not found".to_string())
}

async fn find_album(state: &AppState, id: u64) -> ApiResult<Album> {
    state
        .store
        .find_album(id)
        .await?
        .ok_or_else(album_not_found)
}
