//! Request hardening: per-client rate limiting, dotfile refusal and
//! protective response headers.

use crate::error::{ApiError, TOO_MANY_REQUESTS};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower_http::set_header::SetResponseHeaderLayer;

/// Tracked clients above which expired windows are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// Fixed-window request counter keyed by client address.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<IpAddr, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Count a request from `ip`; false once it has used up its window.
    pub async fn check_limit(&self, ip: IpAddr) -> bool {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        if requests.len() > PRUNE_THRESHOLD {
            let window = self.window;
            requests.retain(|_, (_, started)| now.duration_since(*started) < window);
        }

        let entry = requests.entry(ip).or_insert((0, now));
        if now.duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }

        if entry.0 >= self.max_requests {
            tracing::warn!("Rate limit exceeded for {}", ip);
            return false;
        }

        entry.0 += 1;
        tracing::debug!(
            "Rate limit check passed for {}: {}/{}",
            ip,
            entry.0,
            self.max_requests
        );
        true
    }
}

/// Reject requests over the client's limit with a JSON 429.
///
/// The client is the peer address; without connection info every request
/// shares one bucket.
pub(crate) async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !limiter.check_limit(ip).await {
        return ApiError::new(StatusCode::TOO_MANY_REQUESTS, TOO_MANY_REQUESTS).into_response();
    }
    next.run(request).await
}

/// Hidden files under the public root are never served.
pub(crate) async fn refuse_dotfiles(request: Request, next: Next) -> Response {
    if is_dotfile_path(request.uri().path()) {
        return ApiError::not_found("Not found").into_response();
    }
    next.run(request).await
}

fn is_dotfile_path(path: &str) -> bool {
    path.split('/').any(|segment| {
        segment.starts_with('.')
            || segment
                .get(..3)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("%2e"))
    })
}

/// Headers added to every response that does not already set them.
pub(crate) fn security_headers() -> Vec<SetResponseHeaderLayer<HeaderValue>> {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::REFERRER_POLICY, "no-referrer"),
        (header::X_DNS_PREFETCH_CONTROL, "off"),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            "none",
        ),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            "same-origin",
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            "same-origin",
        ),
    ]
    .into_iter()
    .map(|(name, value)| {
        SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
    })
    .collect()
}
