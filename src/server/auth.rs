//! Bearer-token authentication.
//!
//! Tokens are HS256-signed JWTs carrying the user's id and email. They are
//! stateless: there is no session store, no refresh and no revocation, and a
//! token stays valid until it expires (7 days after issue by default).
//!
//! ```text
//! Authorization: Bearer <header>.<claims>.<signature>
//!
//! claims = { "userId": "<uuid>", "email": "...", "iat": <secs>, "exp": <secs> }
//! ```
//!
//! # Example
//!
//! ```rust
//! use photo_browser::server::auth::{Identity, TokenAuth};
//! use uuid::Uuid;
//!
//! let auth = TokenAuth::new("my-secret-key");
//! let identity = Identity { user_id: Uuid::new_v4(), email: "a@example.com".into() };
//!
//! let token = auth.issue(&identity).unwrap();
//! assert_eq!(auth.verify(&token).unwrap(), identity);
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use http::header::AUTHORIZATION;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, AuthError};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

// =============================================================================
// Types
// =============================================================================

/// The authenticated caller, as embedded in a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

// =============================================================================
// Token issuing and verification
// =============================================================================

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenAuth {
    /// Create an authenticator with the default 7-day token lifetime.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
        }
    }

    /// Override the token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `identity`.
    pub fn issue(&self, identity: &Identity) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: identity.user_id.to_string(),
            email: identity.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Check a token's signature and expiry and return the identity it carries.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let user_id =
            Uuid::parse_str(&data.claims.user_id).map_err(|_| AuthError::InvalidToken)?;

        Ok(Identity {
            user_id,
            email: data.claims.email,
        })
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MissingToken),
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Reject requests without a valid bearer token; otherwise attach the
/// caller's [`Identity`] to the request for [`AuthUser`].
///
/// # Example
///
/// ```ignore
/// use axum::{handler::Handler, middleware, routing::post, Router};
///
/// let app = Router::new().route(
///     "/api/albums",
///     post(create_album.layer(middleware::from_fn_with_state(auth, auth_middleware))),
/// );
/// ```
pub async fn auth_middleware(
    State(auth): State<TokenAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = bearer_token(header)?;
    let identity = auth.verify(token)?;

    debug!(user_id = %identity.user_id, "Authenticated request");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller. Only usable behind [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or(ApiError::Auth(AuthError::MissingToken))
    }
}

// =============================================================================
// Tests
// =============================================================================
