use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::apikey_service::{self, ApiKeyInput};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session};
use crate::routes::{success, success_page};
use crate::state::AppState;

/// 仅 owner 可管理 API Key
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/api-keys", get(list).post(create))
        .route("/api/api-keys/:id", delete(revoke))
}

#[utoipa::path(get, path = "/api/api-keys", tag = "api-keys", responses((status = 200, description = "API keys (hash never returned)"), (status = 403, description = "Owner role required")))]
pub async fn list(State(state): State<AppState>, session: Session, Query(page): Query<Pagination>) -> Result<Json<Value>, ApiError> {
    session.require_owner()?;
    success_page("apiKeys", apikey_service::list_api_keys(&state.db, session.claims.bid, page).await?)
}

/// 明文 key 只在此响应中出现一次
#[utoipa::path(post, path = "/api/api-keys", tag = "api-keys", request_body = crate::openapi::ApiKeyRequest, responses((status = 201, description = "Created; plaintext key returned once"), (status = 403, description = "Owner role required")))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<ApiKeyInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    session.require_owner()?;
    let issued = apikey_service::create_api_key(&state.db, &session.ctx(), input, state.config.rate_limit.default_per_minute).await?;
    let Json(mut body) = success("apiKey", &issued.api_key)?;
    if let Value::Object(map) = &mut body {
        map.insert("key".into(), Value::String(issued.key));
    }
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(delete, path = "/api/api-keys/{id}", tag = "api-keys", params(("id" = Uuid, Path, description = "API key id")), responses((status = 204, description = "Revoked"), (status = 404, description = "Not Found")))]
pub async fn revoke(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    session.require_owner()?;
    apikey_service::revoke_api_key(&state.db, &session.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
