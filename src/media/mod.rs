//! Uploaded image handling: acceptance checks, resizing, and remote storage.
//!
//! ```text
//!   multipart file ──▶ UploadedImage::accept ──▶ ImageProcessor::process ──▶ AssetStorage::put
//!                       (type, size)              (main + thumbnail)          (main, then thumbnail)
//! ```

mod processor;
mod storage;
mod upload;

pub use processor::{
    ImageProcessor, ProcessedImage, MAIN_MAX_DIMENSION, MAIN_QUALITY, THUMBNAIL_DIMENSION,
    THUMBNAIL_QUALITY,
};
pub use storage::{
    asset_key, create_s3_client, default_base_url, delete_best_effort, AssetStorage,
    S3AssetStorage, StoredAsset, PHOTO_FOLDER, THUMBNAIL_FOLDER,
};
pub use upload::{check_size, UploadedImage, ACCEPTED_TYPES, MAX_UPLOAD_BYTES};
