//! Centralized error responder.
//!
//! Every failure a handler, extractor or middleware returns is an
//! [`ApiError`], and this is the only place one becomes an HTTP response.
//!
//! ```text
//!   ApiError ──classify──▶ (status, error_type, public message)
//!                 │
//!                 ├── 5xx: logged at error!, body is "Internal server error"
//!                 │        and the detail rides along as an ErrorDetail
//!                 │        extension (exposed only in development)
//!                 ├── 401/404: logged at debug!
//!                 └── other 4xx: logged at warn!
//! ```

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http::header::RETRY_AFTER;
use http::HeaderValue;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::rate_limit::{ceil_secs, set_rate_limit_headers};
use crate::config::Environment;
use crate::error::{ApiError, MediaError, StoreError};
use crate::validation::FieldError;

/// Public message of every 5xx response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

// =============================================================================
// Response body
// =============================================================================

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Field-level violations (validation failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,

    /// Human-readable wait (rate limiting only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,

    /// Internal detail (5xx in development only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Error variant followed by its source chain (5xx in development only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            retry_after: None,
            message: None,
            stack: None,
        }
    }
}

/// Internal detail of a 5xx response, attached as a response extension.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    pub stack: Vec<String>,
}

impl ErrorDetail {
    fn capture(err: &ApiError) -> Self {
        let mut stack = vec![format!("{:?}", err)];
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            stack.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            stack,
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Map an error to its status, a stable type tag for logs, and the message
/// clients see.
fn classify(err: &ApiError) -> (StatusCode, &'static str, String) {
    match err {
        ApiError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Validation failed".to_string(),
        ),
        ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
        ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
        ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
        ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
        ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
        ApiError::TooManyRequests { message, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            message.clone(),
        ),
        ApiError::Auth(e) => (StatusCode::UNAUTHORIZED, "unauthorized", e.to_string()),

        ApiError::Store(StoreError::Duplicate { field }) => (
            StatusCode::CONFLICT,
            "duplicate",
            format!("{} already exists", field),
        ),
        ApiError::Store(StoreError::InvalidId(_)) => (
            StatusCode::BAD_REQUEST,
            "invalid_id",
            "Invalid ID format".to_string(),
        ),
        ApiError::Store(StoreError::Backend(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            INTERNAL_ERROR_MESSAGE.to_string(),
        ),

        ApiError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            INTERNAL_ERROR_MESSAGE.to_string(),
        ),

        ApiError::Media(e @ MediaError::UnsupportedFormat)
        | ApiError::Media(e @ MediaError::TooLarge { .. }) => {
            (StatusCode::BAD_REQUEST, "invalid_upload", e.to_string())
        }
        ApiError::Media(MediaError::Decode { .. }) => (
            StatusCode::BAD_REQUEST,
            "invalid_image",
            "Unable to process image".to_string(),
        ),
        ApiError::Media(MediaError::Encode { .. }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "media_error",
            INTERNAL_ERROR_MESSAGE.to_string(),
        ),

        ApiError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            INTERNAL_ERROR_MESSAGE.to_string(),
        ),
    }
}

/// Render a window length the way clients are told to wait.
pub fn describe_window(window: Duration) -> String {
    let secs = window.as_secs();
    let (value, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

// =============================================================================
// IntoResponse
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = classify(&self);

        // Log errors based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
        } else if status == StatusCode::NOT_FOUND || status == StatusCode::UNAUTHORIZED {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let mut body = ErrorResponse::new(message);

        match self {
            ApiError::Validation(details) => {
                body.details = Some(details);
                (status, Json(body)).into_response()
            }
            ApiError::TooManyRequests {
                retry_after,
                window,
                limit,
                ..
            } => {
                body.retry_after = Some(describe_window(window));
                let mut response = (status, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert(RETRY_AFTER, HeaderValue::from(ceil_secs(retry_after)));
                set_rate_limit_headers(headers, limit, 0, retry_after);
                response
            }
            other if status.is_server_error() => {
                let mut response = (status, Json(body)).into_response();
                response
                    .extensions_mut()
                    .insert(ErrorDetail::capture(&other));
                response
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}

// =============================================================================
// Development detail
// =============================================================================

/// In development, rewrite 5xx bodies to include the internal detail.
pub async fn expose_error_details(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if !environment.is_development() {
        return response;
    }

    match response.extensions().get::<ErrorDetail>() {
        Some(detail) => {
            let mut body = ErrorResponse::new(INTERNAL_ERROR_MESSAGE);
            body.message = Some(detail.message.clone());
            body.stack = Some(detail.stack.clone());
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(http::header::CONTENT_LENGTH);
            (parts, Json(body)).into_response()
        }
        None => response,
    }
}

/// Fallback for unmatched routes.
pub async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Route not found")),
    )
        .into_response()
}
