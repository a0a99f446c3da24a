//! Router configuration for the photo browser API.
//!
//! This module defines the HTTP routes and assembles the middleware pipeline.
//!
//! # Route Structure
//!
//! ```text
//! /health                        - Health check (public)
//! /api/auth/register             - POST (auth rate limit)
//! /api/auth/login                - POST (auth rate limit)
//! /api/auth/me                   - GET (bearer)
//! /api/albums                    - GET, POST (bearer)
//! /api/albums/{id}               - GET, PUT (bearer), DELETE (bearer)
//! /api/albums/{id}/photos        - GET
//! /api/photos                    - GET, POST (bearer, upload rate limit, multipart)
//! /api/photos/{id}               - GET, PUT (bearer), DELETE (bearer)
//! /api/users/{id}                - GET
//! ```
//!
//! # Pipeline
//!
//! ```text
//!   security headers ─▶ CORS ─▶ trace ─▶ error detail ─▶ api rate limit ─▶ route
//!                                                                            │
//!                           (per route) body limit ─▶ tier rate limit ─▶ bearer auth ─▶ handler
//! ```
//!
//! # Example
//!
//! ```ignore
//! use photo_browser::server::{create_router, AppState, RouterConfig};
//!
//! let state = AppState::new(store, storage, TokenAuth::new("my-secret-key"));
//! let config = RouterConfig::new(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(state, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::auth::auth_middleware;
use super::errors::{expose_error_details, route_not_found};
use super::handlers::{albums, auth, health_handler, photos, users, AppState};
use super::rate_limit::{rate_limit_middleware, RateLimiters};
use super::security::with_security_headers;
use crate::config::Environment;
use crate::media::MAX_UPLOAD_BYTES;

/// Headroom over the file ceiling for the multipart envelope and text fields.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,

    /// Development exposes internal error detail on 5xx responses
    pub environment: Environment,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Rate limiter tiers (shared counters)
    pub rate_limiters: RateLimiters,
}

impl RouterConfig {
    /// Create a new router configuration allowing the given CORS origins.
    ///
    /// By default:
    /// - Environment is production
    /// - Tracing is enabled
    /// - Rate limiters key on the peer address
    pub fn new(cors_origins: Vec<String>) -> Self {
        Self {
            cors_origins,
            environment: Environment::Production,
            enable_tracing: true,
            rate_limiters: RateLimiters::default(),
        }
    }

    /// Set the allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the deployment environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Use the given rate limiters (e.g. to share them with a sweeper task).
    pub fn with_rate_limiters(mut self, limiters: RateLimiters) -> Self {
        self.rate_limiters = limiters;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// rate limiters can see the peer address.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let limiters = &config.rate_limiters;

    let auth_routes = Router::new()
        .route(
            "/register",
            post(auth::register.layer(middleware::from_fn_with_state(
                limiters.auth.clone(),
                rate_limit_middleware,
            ))),
        )
        .route(
            "/login",
            post(auth::login.layer(middleware::from_fn_with_state(
                limiters.auth.clone(),
                rate_limit_middleware,
            ))),
        )
        .route(
            "/me",
            get(auth::me.layer(middleware::from_fn_with_state(
                state.auth.clone(),
                auth_middleware,
            ))),
        );

    let album_routes = Router::new()
        .route(
            "/",
            get(albums::list_albums).post(albums::create_album.layer(
                middleware::from_fn_with_state(state.auth.clone(), auth_middleware),
            )),
        )
        .route(
            "/{id}",
            get(albums::get_album)
                .put(albums::update_album.layer(middleware::from_fn_with_state(
                    state.auth.clone(),
                    auth_middleware,
                )))
                .delete(albums::delete_album.layer(middleware::from_fn_with_state(
                    state.auth.clone(),
                    auth_middleware,
                ))),
        )
        .route("/{id}/photos", get(albums::list_album_photos));

    // Innermost first: auth, then the upload tier, then the body ceiling
    let upload = photos::upload_photo
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            limiters.upload.clone(),
            rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD));

    let photo_routes = Router::new()
        .route("/", get(photos::list_photos).post(upload))
        .route(
            "/{id}",
            get(photos::get_photo)
                .put(photos::update_photo.layer(middleware::from_fn_with_state(
                    state.auth.clone(),
                    auth_middleware,
                )))
                .delete(photos::delete_photo.layer(middleware::from_fn_with_state(
                    state.auth.clone(),
                    auth_middleware,
                ))),
        );

    let user_routes = Router::new().route("/{id}", get(users::get_user));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/albums", album_routes)
        .nest("/photos", photo_routes)
        .nest("/users", user_routes)
        .layer(middleware::from_fn_with_state(
            limiters.api.clone(),
            rate_limit_middleware,
        ));

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .method_not_allowed_fallback(route_not_found)
        .fallback(route_not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            config.environment,
            expose_error_details,
        ));

    let router = if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    with_security_headers(router.layer(build_cors_layer(&config)))
}

/// Build the CORS layer based on configuration.
///
/// Credentials are allowed, so origins are always listed explicitly.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)) // 24 hours
}

// =============================================================================
// Tests
// =============================================================================
