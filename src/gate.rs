use std::{
    convert::Infallible,
    future::Future,
    net::{IpAddr, SocketAddr},
};

use axum::{
    Json, async_trait,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::SecondsFormat;
use tracing::warn;

use crate::{
    models::ErrorBody,
    policy::LimiterPolicy,
    rate_limiter::{Decision, RateLimiter},
    state::AppState,
};

pub const UNKNOWN_CLIENT: &str = "unknown";

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

#[async_trait]
impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        Ok(ClientId(resolve_client_id(
            &parts.headers,
            peer,
            state.cfg.trust_proxy,
        )))
    }
}

// Forwarding headers are client-controlled; only read them behind a trusted proxy.
pub fn resolve_client_id(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = header_ip(headers, "x-forwarded-for");
        if let Some(ip) = forwarded.or_else(|| header_ip(headers, "x-real-ip")) {
            return ip.to_string();
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
}

pub async fn with_rate_limit<F, Fut>(limiter: &RateLimiter, client: &ClientId, handler: F) -> Response
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Response>,
{
    let decision = limiter.check(&client.0).await;
    if !decision.allowed {
        warn!(
            policy = limiter.policy().name,
            client = %client.0,
            retry_after_ms = decision.retry_after_ms,
            "rate limit exceeded"
        );
        return rejection(limiter.policy(), &decision);
    }

    handler().await
}

pub async fn api_rate_limit(
    State(state): State<AppState>,
    client: ClientId,
    req: Request,
    next: Next,
) -> Response {
    with_rate_limit(&state.limits.api, &client, || next.run(req)).await
}

fn rejection(policy: &LimiterPolicy, decision: &Decision) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorBody {
            error: policy.message.clone(),
        }),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(
        header::RETRY_AFTER,
        HeaderValue::from(decision.retry_after_ms.div_ceil(1000)),
    );
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
    let reset = decision
        .reset_at
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    if let Ok(value) = HeaderValue::from_str(&reset) {
        headers.insert(X_RATELIMIT_RESET, value);
    }

    response
}
