//! Fixed-window rate limiting keyed by client address.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use cashtrackr_shared::AppError;
use dashmap::DashMap;
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;

/// Message returned once a client exhausts its window.
const LIMIT_REACHED: &str = "Has alcanzado el límite de peticiones";

/// Per-client request counters.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    trust_proxy: bool,
    clients: DashMap<String, (u32, Instant)>,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window`, keyed by peer address.
    #[must_use]
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            trust_proxy: false,
            clients: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Keys clients by the first `X-Forwarded-For` hop.
    ///
    /// Only enable behind a proxy that overwrites the header.
    #[must_use]
    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    /// Counts one request for `client`.
    ///
    /// Returns the remaining budget, or the seconds until the window resets.
    pub fn check(&self, client: &str) -> Result<u32, u64> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Result<u32, u64> {
        self.sweep(now);

        let mut entry = self.clients.entry(client.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) >= self.window {
            *count = 0;
            *window_start = now;
        }

        if *count >= self.max_requests {
            let retry_after = self
                .window
                .checked_sub(now.duration_since(*window_start))
                .unwrap_or(Duration::ZERO)
                .as_secs();
            return Err(retry_after);
        }

        *count += 1;
        Ok(self.max_requests - *count)
    }

    /// Drops clients whose window has ended, at most once per window.
    fn sweep(&self, now: Instant) {
        let Ok(mut last_sweep) = self.last_sweep.lock() else {
            return;
        };
        if now.duration_since(*last_sweep) < self.window {
            return;
        }
        *last_sweep = now;
        drop(last_sweep);

        self.clients
            .retain(|_, (_, window_start)| now.duration_since(*window_start) < self.window);
    }

    /// Maximum requests per window.
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Number of clients with a live counter.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Client identifier: the peer address, or the first `X-Forwarded-For`
    /// hop when the proxy is trusted.
    fn client_id(&self, request: &Request) -> String {
        let forwarded = || {
            request
                .headers()
                .get("X-Forwarded-For")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let peer = || {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };

        let client = if self.trust_proxy {
            forwarded().or_else(peer)
        } else {
            peer()
        };
        client.unwrap_or_else(|| "unknown".to_string())
    }
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client = state.rate_limiter.client_id(&request);

    match state.rate_limiter.check(&client) {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", state.rate_limiter.max_requests().into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            response
        }
        Err(retry_after) => {
            warn!(client = %client, "Rate limit reached");
            let mut response =
                ApiError(AppError::TooManyRequests(LIMIT_REACHED.to_string())).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, retry_after.into());
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_within_window() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let now = Instant::now();

        assert_eq!(limiter.check_at("a", now), Ok(1));
        assert_eq!(limiter.check_at("a", now), Ok(0));
        assert_eq!(limiter.check_at("a", now), Err(60));
        assert_eq!(limiter.check_at("b", now), Ok(1));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let start = Instant::now();

        assert!(limiter.check_at("a", start).is_ok());
        assert!(limiter.check_at("a", start + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at("a", start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_expired_clients_are_swept() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 5);
        let start = Instant::now();

        for i in 0..10 {
            limiter.check_at(&format!("10.0.0.{i}"), start).unwrap();
        }
        assert_eq!(limiter.tracked_clients(), 10);

        limiter
            .check_at("10.0.1.1", start + Duration::from_secs(61))
            .unwrap();
        assert_eq!(limiter.tracked_clients(), 1);
    }

    fn request(forwarded: Option<&str>, peer: Option<[u8; 4]>) -> Request {
        let mut builder = Request::builder();
        if let Some(forwarded) = forwarded {
            builder = builder.header("X-Forwarded-For", forwarded);
        }
        let mut request = builder.body(axum::body::Body::empty()).unwrap();
        if let Some(ip) = peer {
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::from((ip, 4000))));
        }
        request
    }

    #[test]
    fn test_client_id_ignores_forwarded_header_by_default() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);

        assert_eq!(
            limiter.client_id(&request(Some("10.0.0.1"), Some([127, 0, 0, 1]))),
            "127.0.0.1"
        );
        assert_eq!(limiter.client_id(&request(Some("10.0.0.1"), None)), "unknown");
    }

    #[test]
    fn test_client_id_uses_first_hop_behind_trusted_proxy() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1).trust_proxy(true);

        assert_eq!(
            limiter.client_id(&request(Some("10.0.0.1, 10.0.0.2"), Some([127, 0, 0, 1]))),
            "10.0.0.1"
        );
        assert_eq!(
            limiter.client_id(&request(None, Some([127, 0, 0, 1]))),
            "127.0.0.1"
        );
    }
}
