use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::Value;
use tracing::info;

use service::auth::domain::{LoginInput, RegisterInput};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session, AUTH_COOKIE};
use crate::routes::success;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// 未登录时创建新企业并成为 owner；owner 会话下注册则邀请员工加入本企业
#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<AppState>,
    inviter: Option<Session>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state.auth.register(input, inviter.as_ref().map(|s| &s.claims)).await?;
    Ok((StatusCode::CREATED, success("user", user)?))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in; sets the auth_token cookie"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.config.auth.secure_cookie);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);

    let Json(mut body) = success("user", &session.user)?;
    if let Value::Object(map) = &mut body {
        map.insert("token".into(), Value::String(session.token));
        map.insert("expiresAt".into(), Value::from(session.expires_at));
    }
    info!(user_id = %session.user.id, "login cookie issued");
    Ok((jar, Json(body)))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 200, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> Result<(CookieJar, Json<Value>), ApiError> {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    Ok((jar.remove(cookie), success("loggedOut", true)?))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<AppState>, session: Session) -> Result<Json<Value>, ApiError> {
    let user = state.auth.current_user(&session.claims).await?;
    success("user", user)
}
