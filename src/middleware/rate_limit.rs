use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

use crate::error::BridgeError;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Per-client-IP limiter allowing `per_hour` requests, all of them burstable.
pub fn build_limiter(per_hour: u32) -> Arc<IpRateLimiter> {
    let quota = Quota::per_hour(NonZeroU32::new(per_hour).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}

/// Requests without peer info (in-process callers) share one bucket.
pub async fn rate_limit(
    State(limiter): State<Arc<IpRateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check_key(&ip).is_err() {
        warn!(%ip, path = %req.uri().path(), "rate limit exceeded");
        return BridgeError::RateLimited.into_response();
    }
    next.run(req).await
}
