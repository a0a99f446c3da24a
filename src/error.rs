use std::time::Duration;

use thiserror::Error;

use crate::validation::FieldError;

/// Errors raised by the persistence layer.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A unique field (email, username, numeric id) already holds this value
    #[error("Duplicate value for unique field: {field}")]
    Duplicate { field: String },

    /// An identifier could not be interpreted by the store
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// The backing store failed
    #[error("Store error: {0}")]
    Backend(String),
}

/// Errors raised by remote asset storage.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Uploading an object failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Deleting an object failed
    #[error("Delete failed: {0}")]
    Delete(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors raised while accepting or processing an uploaded image.
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    /// File extension or content type is not an accepted image format
    #[error("Only image files are allowed (jpeg, jpg, png, gif, webp)")]
    UnsupportedFormat,

    /// File exceeds the upload size ceiling
    #[error("File too large. Maximum size is 5MB")]
    TooLarge { size: usize, max: usize },

    /// Source bytes could not be decoded as an image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Processed image could not be encoded
    #[error("Failed to encode image: {message}")]
    Encode { message: String },
}

/// Bearer-token failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header, or a scheme other than `Bearer`
    #[error("No token provided")]
    MissingToken,

    /// Token is malformed or its signature does not verify
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is valid but it has expired
    #[error("Token expired")]
    Expired,
}

/// Every failure a request handler can surface.
///
/// Handlers never build error responses themselves; they return one of these
/// and the responder in [`crate::server::errors`] renders it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request input failed schema validation (400, with field detail)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 401
    #[error("{0}")]
    Unauthorized(String),

    /// 403
    #[error("{0}")]
    Forbidden(String),

    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 409
    #[error("{0}")]
    Conflict(String),

    /// 429, carrying the window the client must wait out
    #[error("{message}")]
    TooManyRequests {
        message: String,
        /// Time until the client's window resets
        retry_after: Duration,
        /// Full length of the limiter's window
        window: Duration,
        /// Ceiling of the limiter that rejected the request
        limit: u32,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Media(#[from] MediaError),

    /// 500
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Build a validation error for a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }
}

/// Convenience alias used by handlers.
pub type ApiResult<T> = Result<T, ApiError>;
