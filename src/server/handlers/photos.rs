//! Photo handlers.
//!
//! # Upload pipeline
//!
//! ```text
//!   multipart ──▶ accept file (type, size) ──▶ validate title/albumId ──▶ album exists?
//!                                                                            │
//!   201 ◀── insert record ◀── put thumbnail ◀── put main ◀── resize (blocking pool)
//! ```
//!
//! Assets are uploaded before the record is written. When a later step fails,
//! the assets already uploaded are removed best-effort.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{blocking, AppState, MessageResponse, Views};
use crate::error::{ApiError, ApiResult, MediaError};
use crate::media::{
    check_size, delete_best_effort, StoredAsset, UploadedImage, MAX_UPLOAD_BYTES, PHOTO_FOLDER,
    THUMBNAIL_FOLDER,
};
use crate::model::{Photo, PhotoView};
use crate::server::auth::{AuthUser, Identity};
use crate::store::{create_photo, Pagination};
use crate::validation::{
    validate, PhotoListParams, PhotoUpload, ResourceId, UpdatePhotoRequest, UploadPhotoForm,
    ValidatedJson, ValidatedQuery,
};

/// Content type of every stored rendition.
const JPEG: &str = "image/jpeg";

#[derive(Debug, Serialize)]
pub struct PhotoListResponse {
    pub photos: Vec<PhotoView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub message: &'static str,
    pub photo: PhotoView,
}

/// `GET /api/photos`
pub async fn list_photos(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PhotoListParams>,
) -> ApiResult<Json<PhotoListResponse>> {
    let listing = state.store.list_photos(&query).await?;
    let photos = Views::new(state.store.as_ref())
        .photo_views(&listing.items)
        .await?;

    Ok(Json(PhotoListResponse {
        photos,
        pagination: Pagination::new(query.page, listing.total),
    }))
}

/// `GET /api/photos/{id}`
pub async fn get_photo(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<PhotoView>> {
    let photo = find_photo(&state, id).await?;
    let view = Views::new(state.store.as_ref()).photo_view(&photo).await?;
    Ok(Json(view))
}

// =============================================================================
// Upload
// =============================================================================

/// Parsed multipart upload: the accepted file (if any) and the raw text fields.
#[derive(Default)]
struct UploadParts {
    image: Option<UploadedImage>,
    form: UploadPhotoForm,
}

/// `POST /api/photos` (multipart: `image`, `title`, `albumId`)
pub async fn upload_photo(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<PhotoResponse>)> {
    let mut multipart = multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let parts = read_upload(&mut multipart).await?;
    let fields = validate(parts.form)?;
    let image = parts
        .image
        .ok_or_else(|| ApiError::BadRequest("Image file is required".to_string()))?;

    let album = state
        .store
        .find_album(fields.album_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Album not found".to_string()))?;

    debug!(
        filename = %image.filename,
        size = image.data.len(),
        album_id = album.id,
        "Processing upload"
    );
    let processor = state.processor.clone();
    let source = image.data;
    let processed = blocking("Image processing", move || {
        processor.process(&source).map_err(ApiError::from)
    })
    .await?;

    let main = state
        .storage
        .put(PHOTO_FOLDER, processed.main, JPEG)
        .await?;
    let thumbnail = match state
        .storage
        .put(THUMBNAIL_FOLDER, processed.thumbnail, JPEG)
        .await
    {
        Ok(thumbnail) => thumbnail,
        Err(e) => {
            delete_best_effort(state.storage.as_ref(), &main.key).await;
            return Err(e.into());
        }
    };

    let photo = match insert_photo(&state, &caller, fields, &main, &thumbnail).await {
        Ok(photo) => photo,
        Err(e) => {
            warn!(error = %e, "Photo record not created, removing uploaded assets");
            delete_best_effort(state.storage.as_ref(), &main.key).await;
            delete_best_effort(state.storage.as_ref(), &thumbnail.key).await;
            return Err(e);
        }
    };

    info!(photo_id = photo.id, album_id = photo.album_id, user_id = %caller.user_id, "Uploaded photo");
    let view = Views::new(state.store.as_ref()).photo_view(&photo).await?;

    Ok((
        StatusCode::CREATED,
        Json(PhotoResponse {
            message: "Photo uploaded successfully",
            photo: view,
        }),
    ))
}

async fn insert_photo(
    state: &AppState,
    caller: &Identity,
    fields: PhotoUpload,
    main: &StoredAsset,
    thumbnail: &StoredAsset,
) -> ApiResult<Photo> {
    let now = Utc::now();
    let photo = create_photo(
        state.store.as_ref(),
        Photo {
            id: 0,
            title: fields.title,
            url: main.url.clone(),
            thumbnail_url: thumbnail.url.clone(),
            album_id: fields.album_id,
            user_id: caller.user_id,
            asset_key: main.key.clone(),
            thumbnail_key: thumbnail.key.clone(),
            created_at: now,
            updated_at: now,
        },
    )
    .await?;
    Ok(photo)
}

/// Read every multipart field. The image is accepted or rejected as soon as
/// it has been read; unknown fields are skipped.
async fn read_upload(multipart: &mut Multipart) -> ApiResult<UploadParts> {
    let mut parts = UploadParts::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = read_capped(&mut field).await?;
                parts.image = Some(UploadedImage::accept(&filename, &content_type, data)?);
            }
            "title" => parts.form.title = Some(field.text().await.map_err(multipart_error)?),
            "albumId" => parts.form.album_id = Some(field.text().await.map_err(multipart_error)?),
            _ => debug!(field = %name, "Ignoring multipart field"),
        }
    }

    Ok(parts)
}

/// Buffer a file field, giving up as soon as it exceeds the upload ceiling.
async fn read_capped(field: &mut Field<'_>) -> ApiResult<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        check_size(buf.len() + chunk.len())?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return MediaError::TooLarge {
            size: MAX_UPLOAD_BYTES + 1,
            max: MAX_UPLOAD_BYTES,
        }
        .into();
    }
    ApiError::BadRequest(err.body_text())
}

// =============================================================================
// Update / delete
// =============================================================================

/// `PUT /api/photos/{id}`
pub async fn update_photo(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ResourceId(id): ResourceId,
    ValidatedJson(changes): ValidatedJson<UpdatePhotoRequest>,
) -> ApiResult<Json<PhotoResponse>> {
    let mut photo = find_photo(&state, id).await?;
    if !photo.is_owned_by(caller.user_id) {
        return Err(ApiError::Forbidden(
            "You can only update your own photos".to_string(),
        ));
    }

    if let Some(album_id) = changes.album_id {
        let album = state
            .store
            .find_album(album_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Album not found".to_string()))?;
        if !album.is_owned_by(caller.user_id) {
            return Err(ApiError::Forbidden(
                "You can only move photos into your own albums".to_string(),
            ));
        }
        photo.album_id = album.id;
        photo.updated_at = Utc::now();
    }
    if let Some(title) = changes.title {
        photo.title = title;
        photo.updated_at = Utc::now();
    }

    let photo = state
        .store
        .update_photo(photo)
        .await?
        .ok_or_else(photo_not_found)?;
    let view = Views::new(state.store.as_ref()).photo_view(&photo).await?;

    Ok(Json(PhotoResponse {
        message: "Photo updated successfully",
        photo: view,
    }))
}

/// `DELETE /api/photos/{id}`
///
/// Remote assets are removed best-effort; the record is removed regardless.
pub async fn delete_photo(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<MessageResponse>> {
    let photo = find_photo(&state, id).await?;
    if !photo.is_owned_by(caller.user_id) {
        return Err(ApiError::Forbidden(
            "You can only delete your own photos".to_string(),
        ));
    }

    let main_deleted = delete_best_effort(state.storage.as_ref(), &photo.asset_key).await;
    let thumbnail_deleted =
        delete_best_effort(state.storage.as_ref(), &photo.thumbnail_key).await;
    if !(main_deleted && thumbnail_deleted) {
        warn!(photo_id = photo.id, "Removing photo record with orphaned assets");
    }

    if !state.store.delete_photo(photo.id).await? {
        return Err(photo_not_found());
    }
    info!(photo_id = photo.id, "Deleted photo");

    Ok(Json(MessageResponse {
        message: "Photo deleted successfully",
    }))
}

fn photo_not_found() -> ApiError {
    ApiError::NotFound("Photo not found".to_string())
}

async fn find_photo(state: &AppState, id: u64) -> ApiResult<Photo> {
    state
        .store
        .find_photo(id)
        .await?
        .ok_or_else(photo_not_found)
}
