//! Per-client request budget. Once a client's budget is spent every request
//! is answered with 429 until the window refills it.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::config::ApiConfig;
use crate::error::ApiError;

pub const TOO_MANY_REQUESTS: &str = "Too many requests, please try again later.";

/// Keyed by peer address.
#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl ClientRateLimiter {
    /// `requests` per `window`, refilled evenly across the window.
    pub fn new(requests: u32, window: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(requests)?;
        let quota = Quota::with_period(window / requests)?.allow_burst(burst);
        Some(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        })
    }

    /// `None` when limiting is disabled or the configured budget is empty.
    pub fn from_config(config: &ApiConfig) -> Option<Self> {
        if !config.enable_rate_limiting {
            return None;
        }
        let limiter = Self::new(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        );
        if limiter.is_none() {
            tracing::warn!(
                "Rate limiting enabled with an empty budget ({} requests / {}s); not limiting",
                config.rate_limit_requests,
                config.rate_limit_window_secs
            );
        }
        limiter
    }

    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }
}

pub async fn rate_limit(
    State(limiter): State<ClientRateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_ip(&req);
    if !limiter.check(client) {
        tracing::warn!("Rate limit exceeded for {}", client);
        return Err(ApiError::too_many_requests(TOO_MANY_REQUESTS));
    }
    Ok(next.run(req).await)
}

// Requests served without connect info (in-process tests) share one bucket.
fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_per_client() {
        let limiter = ClientRateLimiter::new(2, Duration::from_secs(600)).unwrap();
        let first: IpAddr = "10.0.0.1".parse().unwrap();
        let second: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(first));
        assert!(limiter.check(first));
        assert!(!limiter.check(first));
        assert!(limiter.check(second));
    }

    #[test]
    fn disabled_or_empty_budget_builds_nothing() {
        let mut config = crate::config::AppConfig::development().api;
        config.enable_rate_limiting = false;
        assert!(ClientRateLimiter::from_config(&config).is_none());

        config.enable_rate_limiting = true;
        config.rate_limit_requests = 0;
        assert!(ClientRateLimiter::from_config(&config).is_none());

        config.rate_limit_requests = 100;
        assert!(ClientRateLimiter::from_config(&config).is_some());
    }
}
