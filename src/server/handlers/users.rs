//! Public user profiles.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::AppState;
use crate::error::{ApiError, ApiResult, StoreError};
use crate::model::UserProfile;

/// `GET /api/users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let id = Uuid::parse_str(&id).map_err(|_| StoreError::InvalidId(id.clone()))?;

    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}
