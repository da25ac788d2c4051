//! Sliding-window rate limiting
//!
//! Three independent scopes: per API key (per minute), per user (per
//! hour) and per client IP (per hour). The limiter is advisory for
//! availability: when a scope cannot be evaluated (no IP derivable,
//! limiter disabled) the request passes. Successful checks attach
//! `X-RateLimit-*` headers describing the tightest scope consulted.

use crate::auth::middleware::ApiKeyIdentity;
use crate::config::RateLimitConfig;
use crate::database::entities::UserRecord;
use crate::error::AppError;
use axum::{
    extract::{rejection::ExtensionRejection, ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::StateInformationMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use metrics::counter;
use nonzero_ext::nonzero;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

type KeyedLimiter<K> =
    RateLimiter<K, DefaultKeyedStateStore<K>, DefaultClock, StateInformationMiddleware>;

/// Outcome of a rate check, carried into response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

pub struct RateLimitService {
    config: RateLimitConfig,
    by_api_key: KeyedLimiter<String>,
    by_user: KeyedLimiter<i32>,
    by_ip: KeyedLimiter<IpAddr>,
}

impl RateLimitService {
    pub fn new(config: RateLimitConfig) -> Self {
        let api_key_quota = Quota::per_minute(nonzero_or_one(config.api_key_rpm));
        let user_quota = Quota::per_hour(nonzero_or_one(config.user_rph));
        let ip_quota = Quota::per_hour(nonzero_or_one(config.ip_rph));

        Self {
            config,
            by_api_key: RateLimiter::keyed(api_key_quota)
                .with_middleware::<StateInformationMiddleware>(),
            by_user: RateLimiter::keyed(user_quota)
                .with_middleware::<StateInformationMiddleware>(),
            by_ip: RateLimiter::keyed(ip_quota).with_middleware::<StateInformationMiddleware>(),
        }
    }

    /// Check every applicable scope; the returned status describes the
    /// scope with the fewest remaining requests.
    pub fn check(
        &self,
        api_key_hash: Option<&str>,
        user_id: Option<i32>,
        ip: Option<IpAddr>,
    ) -> Result<Option<RateLimitStatus>, AppError> {
        if !self.config.enabled {
            return Ok(None);
        }

        let mut tightest: Option<RateLimitStatus> = None;

        if let Some(hash) = api_key_hash {
            let status = Self::check_scope(
                &self.by_api_key,
                &hash.to_string(),
                self.config.api_key_rpm,
                60,
                "api_key",
            )?;
            tightest = Some(tighter(tightest, status));
        }

        if let Some(user_id) = user_id {
            let status =
                Self::check_scope(&self.by_user, &user_id, self.config.user_rph, 3600, "user")?;
            tightest = Some(tighter(tightest, status));
        }

        if let Some(ip) = ip {
            let status = Self::check_scope(&self.by_ip, &ip, self.config.ip_rph, 3600, "ip")?;
            tightest = Some(tighter(tightest, status));
        }

        Ok(tightest)
    }

    fn check_scope<K: std::hash::Hash + Eq + Clone>(
        limiter: &KeyedLimiter<K>,
        key: &K,
        limit: u32,
        window_secs: u64,
        scope: &'static str,
    ) -> Result<RateLimitStatus, AppError> {
        match limiter.check_key(key) {
            Ok(snapshot) => Ok(RateLimitStatus {
                limit,
                remaining: snapshot.remaining_burst_capacity(),
                reset_secs: window_secs,
            }),
            Err(not_until) => {
                counter!("rate_limit_exceeded_total", "scope" => scope).increment(1);
                let wait = not_until.wait_time_from(DefaultClock::default().now());
                tracing::warn!(scope, wait_secs = wait.as_secs(), "rate limit exceeded");
                Err(AppError::RateLimited(format!(
                    "rate limit exceeded, retry in {}s",
                    wait.as_secs().max(1)
                )))
            }
        }
    }
}

fn nonzero_or_one(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(nonzero!(1u32))
}

fn tighter(current: Option<RateLimitStatus>, candidate: RateLimitStatus) -> RateLimitStatus {
    match current {
        Some(status) if status.remaining <= candidate.remaining => status,
        _ => candidate,
    }
}

/// Derive the client IP: proxy headers first, then the socket address
fn extract_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> Option<IpAddr> {
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Some(ip) = real_ip.to_str().ok().and_then(|s| s.parse().ok()) {
            return Some(ip);
        }
    }

    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Some(first) = forwarded.to_str().ok().and_then(|s| s.split(',').next()) {
            if let Ok(ip) = first.trim().parse() {
                return Some(ip);
            }
        }
    }

    connect_info.map(|info| info.0.ip())
}

/// Rate limiting middleware; runs after authentication so the key and
/// user scopes are known.
pub async fn rate_limit_middleware(
    State(service): State<Arc<RateLimitService>>,
    connect_info: Result<ConnectInfo<SocketAddr>, ExtensionRejection>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let connect_info = connect_info.ok();
    let ip = extract_ip(request.headers(), connect_info.as_ref());
    let api_key_hash = request
        .extensions()
        .get::<ApiKeyIdentity>()
        .map(|identity| identity.0.clone());
    let user_id = request.extensions().get::<UserRecord>().map(|user| user.id);

    let status = service.check(api_key_hash.as_deref(), user_id, ip)?;

    let mut response = next.run(request).await;
    if let Some(status) = status {
        apply_headers(response.headers_mut(), status);
    }
    Ok(response)
}

fn apply_headers(headers: &mut HeaderMap, status: RateLimitStatus) {
    headers.insert("X-RateLimit-Limit", header_value(status.limit as u64));
    headers.insert("X-RateLimit-Remaining", header_value(status.remaining as u64));
    headers.insert("X-RateLimit-Reset", header_value(status.reset_secs));
}

fn header_value(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_config(api_key_rpm: u32) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            api_key_rpm,
            user_rph: 100,
            ip_rph: 200,
        }
    }

    #[test]
    fn test_disabled_limiter_passes_everything() {
        let service = RateLimitService::new(RateLimitConfig {
            enabled: false,
            ..enabled_config(1)
        });
        for _ in 0..10 {
            assert!(service.check(Some("hash"), Some(1), None).unwrap().is_none());
        }
    }

    #[test]
    fn test_api_key_scope_enforced() {
        let service = RateLimitService::new(enabled_config(2));
        assert!(service.check(Some("k1"), None, None).is_ok());
        assert!(service.check(Some("k1"), None, None).is_ok());
        assert!(matches!(
            service.check(Some("k1"), None, None),
            Err(AppError::RateLimited(_))
        ));
        // Independent key is unaffected
        assert!(service.check(Some("k2"), None, None).is_ok());
    }

    #[test]
    fn test_status_reports_remaining() {
        let service = RateLimitService::new(enabled_config(5));
        let status = service.check(Some("k1"), None, None).unwrap().unwrap();
        assert_eq!(status.limit, 5);
        assert!(status.remaining < 5);
    }

    #[test]
    fn test_extract_ip_prefers_proxy_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        let ip = extract_ip(&headers, None);
        assert_eq!(ip, Some("203.0.113.9".parse().unwrap()));
    }
}
