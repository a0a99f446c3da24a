//! HTTP server layer for the photo browser API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           HTTP Layer                            │
//! │        /api/auth  /api/albums  /api/photos  /api/users          │
//! │                                                                 │
//! │  ┌───────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────────┐ │
//! │  │ handlers  │ │   auth   │ │ rate_limit │ │      routes      │ │
//! │  │ (requests)│ │ (bearer) │ │  (tiers)   │ │ (pipeline order) │ │
//! │  └───────────┘ └──────────┘ └────────────┘ └──────────────────┘ │
//! │  ┌───────────────────────────┐ ┌──────────────────────────────┐ │
//! │  │ errors (ApiError → JSON)  │ │ security (response headers)  │ │
//! │  └───────────────────────────┘ └──────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod security;

pub use auth::{auth_middleware, AuthUser, Identity, TokenAuth};
pub use errors::ErrorResponse;
pub use handlers::{health_handler, AppState, HealthResponse};
pub use rate_limit::{RateLimitPolicy, RateLimiter, RateLimiters};
pub use routes::{create_router, RouterConfig};
