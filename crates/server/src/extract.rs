//! 请求鉴权：看板会话（Bearer 或 `auth_token` Cookie）与外部集成的 `x-api-key`。
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::de::DeserializeOwned;
use tracing::warn;

use service::auth::Claims;
use service::context::TenantContext;
use service::errors::ServiceError;
use service::services::apikey_service::{self, ApiKeyPrincipal};

use crate::errors::ApiError;
use crate::observability::{API_KEY_AUTH_FAILURES_TOTAL, RATE_LIMITED_TOTAL};
use crate::state::AppState;

pub const AUTH_COOKIE: &str = "auth_token";
pub const API_KEY_HEADER: &str = "x-api-key";

/// 已登录的看板用户
#[derive(Clone, Debug)]
pub struct Session {
    pub claims: Claims,
    pub ip: Option<String>,
}

impl Session {
    pub fn ctx(&self) -> TenantContext {
        TenantContext::new(self.claims.bid, self.claims.sub.clone()).with_ip(self.ip.clone())
    }

    pub fn require_owner(&self) -> Result<(), ApiError> {
        if self.claims.is_owner() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("owner role required".into()))
        }
    }

    pub fn require_platform_admin(&self) -> Result<(), ApiError> {
        if self.claims.is_platform_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("platform admin role required".into()))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // 优先 Authorization 头，缺失时回退到 Cookie
        let token = bearer_token(&parts.headers)
            .or_else(|| CookieJar::from_headers(&parts.headers).get(AUTH_COOKIE).map(|c| c.value().to_string()))
            .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))?;
        let claims = state.auth.verify_token(&token).map_err(|e| {
            warn!(path = %parts.uri.path(), error = %e, "session token rejected");
            ApiError::Unauthorized("invalid or expired session".into())
        })?;
        Ok(Session { claims, ip: client_ip(&parts.headers) })
    }
}

/// JSON 请求体；解析失败同样返回 `{"error": "..."}` 与 400
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// `/v1` 路由中间件：校验 API Key 与限流，通过后把调用方放入请求扩展
pub async fn require_api_key(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let raw = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let principal = match apikey_service::authenticate(&state.db, &state.limiter, raw.as_deref()).await {
        Ok(p) => p,
        Err(e) => {
            match &e {
                ServiceError::RateLimited(_) => RATE_LIMITED_TOTAL.inc(),
                ServiceError::Unauthorized(_) => API_KEY_AUTH_FAILURES_TOTAL.inc(),
                _ => {}
            }
            warn!(path = %req.uri().path(), error = %e, "api key request rejected");
            return Err(e.into());
        }
    };
    let rate = principal.rate;
    req.extensions_mut().insert(principal);

    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(rate.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(rate.remaining()));
    Ok(resp)
}

/// 由 `require_api_key` 注入的调用方
pub fn api_key_context(principal: &ApiKeyPrincipal, headers: &HeaderMap) -> TenantContext {
    principal.context().with_ip(client_ip(headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_and_forwarded_headers() {
        let mut h = HeaderMap::new();
        assert!(bearer_token(&h).is_none());
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        h.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        assert_eq!(bearer_token(&h).as_deref(), Some("abc.def"));
        assert_eq!(client_ip(&h).as_deref(), Some("10.0.0.1"));

        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(bearer_token(&h).is_none());
    }
}
