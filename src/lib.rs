//! # Photo Browser
//!
//! REST backend for a photo-album browser: accounts with bearer tokens,
//! albums, and photo uploads that are resized and stored in S3-compatible
//! object storage.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`validation`] - Declarative request schemas and validating extractors
//! - [`model`] - Users, albums, photos and their public views
//! - [`store`] - Persistence trait, list queries and the in-memory store
//! - [`media`] - Upload acceptance, resizing and asset storage
//! - [`server`] - Axum router, authentication, rate limiting and handlers
//! - [`error`] - Error taxonomy
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//!
//! use photo_browser::media::{create_s3_client, S3AssetStorage};
//! use photo_browser::server::{create_router, AppState, RouterConfig, TokenAuth};
//! use photo_browser::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let storage = S3AssetStorage::new(client, "photos", "https://photos.s3.us-east-1.amazonaws.com");
//!     let state = AppState::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(storage),
//!         TokenAuth::new("my-secret-key"),
//!     );
//!
//!     let router = create_router(state, RouterConfig::new(vec!["http://localhost:3000".into()]));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod media;
pub mod model;
pub mod server;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, Environment};
pub use error::{ApiError, ApiResult, AuthError, MediaError, StorageError, StoreError};
pub use server::{create_router, AppState, RouterConfig};
