//! Configuration management for the photo browser API.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `PHOTO_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `PHOTO_HOST` - Server bind address (default: 0.0.0.0)
//! - `PHOTO_PORT` - Server port (default: 5000)
//! - `PHOTO_JWT_SECRET` - Token signing secret (required)
//! - `PHOTO_CLIENT_URL` - Allowed CORS origin (default: http://localhost:3000)
//! - `PHOTO_ENV` - `development` or `production` (default: production)
//! - `PHOTO_S3_BUCKET` - Bucket for uploaded images (required)
//! - `PHOTO_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `PHOTO_S3_REGION` - AWS region (default: us-east-1)
//! - `PHOTO_ASSET_BASE_URL` - Public URL prefix of stored images
//! - `PHOTO_TRUST_PROXY` - Key rate limits on `X-Forwarded-For` (default: false)

use clap::{Parser, ValueEnum};

use crate::media::default_base_url;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default allowed CORS origin.
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment. Development responses include internal error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Photo Browser API - accounts, albums and photo uploads.
#[derive(Parser, Debug, Clone)]
#[command(name = "photo-browser")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "PHOTO_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PHOTO_PORT")]
    pub port: u16,

    /// Origin allowed to make credentialed cross-origin requests.
    #[arg(long, default_value = DEFAULT_CLIENT_URL, env = "PHOTO_CLIENT_URL")]
    pub client_url: String,

    /// Deployment environment.
    #[arg(long, value_enum, default_value_t = Environment::Production, env = "PHOTO_ENV")]
    pub environment: Environment,

    /// Key rate limits on the first `X-Forwarded-For` address.
    ///
    /// Only enable behind a proxy that sets the header.
    #[arg(long, default_value_t = false, env = "PHOTO_TRUST_PROXY")]
    pub trust_proxy: bool,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret used to sign bearer tokens.
    #[arg(long, env = "PHOTO_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// S3 bucket that stores uploaded images.
    #[arg(long, env = "PHOTO_S3_BUCKET")]
    pub s3_bucket: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "PHOTO_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "PHOTO_S3_REGION")]
    pub s3_region: String,

    /// Public URL prefix that stored images are served from.
    ///
    /// Defaults to the bucket's own URL.
    #[arg(long, env = "PHOTO_ASSET_BASE_URL")]
    pub asset_base_url: Option<String>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.trim().is_empty() {
            return Err(
                "Token signing secret is required. Set --jwt-secret or PHOTO_JWT_SECRET"
                    .to_string(),
            );
        }

        if self.s3_bucket.is_empty() {
            return Err(
                "S3 bucket name is required. Set --s3-bucket or PHOTO_S3_BUCKET".to_string(),
            );
        }

        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        if let Some(base) = &self.asset_base_url {
            url::Url::parse(base)
                .map_err(|e| format!("asset_base_url is not a valid URL: {}", e))?;
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public URL prefix for stored images.
    pub fn asset_base_url(&self) -> String {
        match &self.asset_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => default_base_url(
                self.s3_endpoint.as_deref(),
                &self.s3_bucket,
                &self.s3_region,
            ),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
