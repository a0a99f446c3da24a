//! Per-client request rate limiting.
//!
//! Each tier is an independent [`RateLimiter`] with its own counters, so a
//! client exhausting the auth tier can still browse albums. Windows are fixed
//! per client: a window opens on the client's first request and the count
//! resets once it has elapsed.
//!
//! | Tier   | Window | Ceiling | Applied to                              |
//! |--------|--------|---------|-----------------------------------------|
//! | api    | 15 min | 100     | every `/api/*` request                  |
//! | auth   | 15 min | 5       | register, login                         |
//! | upload | 1 hour | 10      | photo upload                            |
//! | strict | 1 hour | 3       | reserved for sensitive operations       |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use http::{HeaderMap, HeaderValue};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ApiError;

// =============================================================================
// Policy
// =============================================================================

/// Ceiling, window and rejection message of one limiter tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub name: &'static str,
    pub max_requests: u32,
    pub window: Duration,
    pub message: &'static str,
}

impl RateLimitPolicy {
    pub const fn new(
        name: &'static str,
        max_requests: u32,
        window: Duration,
        message: &'static str,
    ) -> Self {
        Self {
            name,
            max_requests,
            window,
            message,
        }
    }
}

/// The four tiers.
pub mod tiers {
    use super::RateLimitPolicy;
    use std::time::Duration;

    const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);
    const ONE_HOUR: Duration = Duration::from_secs(60 * 60);

    /// All API traffic.
    pub const API: RateLimitPolicy = RateLimitPolicy::new(
        "api",
        100,
        FIFTEEN_MINUTES,
        "Too many requests from this IP, please try again later.",
    );

    /// Login and registration.
    pub const AUTH: RateLimitPolicy = RateLimitPolicy::new(
        "auth",
        5,
        FIFTEEN_MINUTES,
        "Too many authentication attempts from this IP, please try again later.",
    );

    /// Photo uploads.
    pub const UPLOAD: RateLimitPolicy = RateLimitPolicy::new(
        "upload",
        10,
        ONE_HOUR,
        "Too many upload requests from this IP, please try again later.",
    );

    /// Reserved for sensitive operations.
    pub const STRICT: RateLimitPolicy = RateLimitPolicy::new(
        "strict",
        3,
        ONE_HOUR,
        "Too many requests for this operation, please try again later.",
    );
}

// =============================================================================
// Limiter
// =============================================================================

#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed {
        limit: u32,
        remaining: u32,
        /// Time until the window resets
        reset: Duration,
    },
    Limited {
        limit: u32,
        retry_after: Duration,
    },
}

/// One tier's counters, keyed by client address.
#[derive(Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    trust_proxy: bool,
    states: Arc<RwLock<HashMap<String, WindowState>>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            trust_proxy: false,
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Key clients by the first `X-Forwarded-For` address instead of the peer.
    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Count a request from `key` and decide whether it may proceed.
    ///
    /// Rejected requests are not counted.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let window = self.policy.window;
        let limit = self.policy.max_requests;

        let state = states.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(state.window_start) >= window {
            state.count = 0;
            state.window_start = now;
        }

        let reset = window.saturating_sub(now.duration_since(state.window_start));

        if state.count >= limit {
            return RateLimitDecision::Limited {
                limit,
                retry_after: reset,
            };
        }

        state.count += 1;
        RateLimitDecision::Allowed {
            limit,
            remaining: limit.saturating_sub(state.count),
            reset,
        }
    }

    /// Drop clients whose window has elapsed. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let window = self.policy.window;
        let before = states.len();
        states.retain(|_, state| now.duration_since(state.window_start) < window);
        before - states.len()
    }

    /// Number of clients currently tracked.
    pub async fn key_count(&self) -> usize {
        self.states.read().await.len()
    }

    /// Identify the client a request comes from.
    pub fn client_key(&self, request: &Request) -> String {
        if self.trust_proxy {
            if let Some(ip) = forwarded_for(request.headers()) {
                return ip;
            }
        }
        match request.extensions().get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => addr.ip().to_string(),
            None => "unknown".to_string(),
        }
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// The full set of tiers, sharing one proxy-trust setting.
#[derive(Clone)]
pub struct RateLimiters {
    pub api: RateLimiter,
    pub auth: RateLimiter,
    pub upload: RateLimiter,
    pub strict: RateLimiter,
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::new(false)
    }
}

impl RateLimiters {
    pub fn new(trust_proxy: bool) -> Self {
        Self {
            api: RateLimiter::new(tiers::API).with_trust_proxy(trust_proxy),
            auth: RateLimiter::new(tiers::AUTH).with_trust_proxy(trust_proxy),
            upload: RateLimiter::new(tiers::UPLOAD).with_trust_proxy(trust_proxy),
            strict: RateLimiter::new(tiers::STRICT).with_trust_proxy(trust_proxy),
        }
    }

    fn all(&self) -> [&RateLimiter; 4] {
        [&self.api, &self.auth, &self.upload, &self.strict]
    }

    /// Periodically drop expired client windows from every tier.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let limiters = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                for limiter in limiters.all() {
                    let removed = limiter.sweep().await;
                    if removed > 0 {
                        debug!(tier = limiter.policy.name, removed, "Swept rate limit windows");
                    }
                }
            }
        })
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Count the request against the limiter in state; reject with 429 when the
/// client is over its ceiling, otherwise annotate the response with
/// `RateLimit-*` headers.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = limiter.client_key(&request);

    match limiter.check(&key).await {
        RateLimitDecision::Allowed {
            limit,
            remaining,
            reset,
        } => {
            let mut response = next.run(request).await;
            // The innermost tier reports its own budget
            if !response.headers().contains_key("ratelimit-limit") {
                set_rate_limit_headers(response.headers_mut(), limit, remaining, reset);
            }
            Ok(response)
        }
        RateLimitDecision::Limited { limit, retry_after } => {
            warn!(
                tier = limiter.policy.name,
                client = %key,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Err(ApiError::TooManyRequests {
                message: limiter.policy.message.to_string(),
                retry_after,
                window: limiter.policy.window,
                limit,
            })
        }
    }
}

/// Write the standard `RateLimit-*` headers.
pub fn set_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset: Duration) {
    headers.insert("ratelimit-limit", HeaderValue::from(limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(ceil_secs(reset)));
}

/// Whole seconds, rounded up so a client never retries early.
pub fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

// =============================================================================
// Tests
// =============================================================================
