//! Acceptance rules for uploaded image files.

use bytes::Bytes;

use crate::error::MediaError;

/// Largest accepted upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// File types accepted, by extension and content-type subtype.
pub const ACCEPTED_TYPES: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

/// An uploaded file that passed the type and size checks.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedImage {
    /// Check the file before any processing happens.
    ///
    /// Both the filename extension and the declared content type must name an
    /// accepted image type.
    pub fn accept(filename: &str, content_type: &str, data: Bytes) -> Result<Self, MediaError> {
        if !has_accepted_extension(filename) || !has_accepted_content_type(content_type) {
            return Err(MediaError::UnsupportedFormat);
        }
        check_size(data.len())?;

        Ok(Self {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data,
        })
    }
}

/// Reject sizes over [`MAX_UPLOAD_BYTES`].
pub fn check_size(size: usize) -> Result<(), MediaError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(MediaError::TooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

fn has_accepted_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ACCEPTED_TYPES.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

fn has_accepted_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("image", subtype)) => ACCEPTED_TYPES.contains(&subtype),
        _ => false,
    }
}
