//! 外部集成使用的 API Key：签发、吊销与请求鉴权（含按分钟限流）。
use chrono::{DateTime, FixedOffset, Utc};
use common::crypto::{generate_api_key, key_prefix, sha256_hex};
use common::pagination::Pagination;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use models::apikey::{self, STATUS_ACTIVE, STATUS_REVOKED};

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::rate_limiter::{RateDecision, RateLimiter};
use crate::services::{audit_service, fetch_page, require, Page};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyInput {
    pub name: Option<String>,
    pub rate_limit_per_minute: Option<i32>,
    pub expires_at: Option<DateTime<FixedOffset>>,
}

/// 明文只在创建时返回一次
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedApiKey {
    pub api_key: apikey::Model,
    pub key: String,
}

/// 通过鉴权的调用方
#[derive(Clone, Debug)]
pub struct ApiKeyPrincipal {
    pub key: apikey::Model,
    pub rate: RateDecision,
}

impl ApiKeyPrincipal {
    pub fn context(&self) -> TenantContext {
        TenantContext::api_key(self.key.business_id, &self.key.key_prefix)
    }
}

pub async fn create_api_key<C: ConnectionTrait>(
    db: &C,
    ctx: &TenantContext,
    input: ApiKeyInput,
    default_limit: u32,
) -> Result<IssuedApiKey, ServiceError> {
    let name = require(input.name, "name")?;
    let limit = input.rate_limit_per_minute.unwrap_or(default_limit as i32);
    let plaintext = generate_api_key();
    let created = apikey::create(
        db,
        apikey::NewApiKey {
            business_id: ctx.business_id,
            name,
            key_prefix: key_prefix(&plaintext),
            key_hash: sha256_hex(&plaintext),
            rate_limit_per_minute: limit,
            expires_at: input.expires_at,
        },
    )
    .await?;
    info!(service = "api_keys", event = "api_key_created", key_id = %created.id, prefix = %created.key_prefix);
    audit_service::record(db, ctx, "create", "api_key", Some(created.id), serde_json::json!({ "name": created.name, "prefix": created.key_prefix })).await;
    Ok(IssuedApiKey { api_key: created, key: plaintext })
}

pub async fn list_api_keys<C: ConnectionTrait>(db: &C, business_id: Uuid, opts: Pagination) -> Result<Page<apikey::Model>, ServiceError> {
    let q = apikey::Entity::find()
        .filter(apikey::Column::BusinessId.eq(business_id))
        .order_by_desc(apikey::Column::CreatedAt);
    fetch_page(db, q, opts).await
}

/// 吊销而不物理删除，保留审计可追溯
pub async fn revoke_api_key<C: ConnectionTrait>(db: &C, ctx: &TenantContext, id: Uuid) -> Result<apikey::Model, ServiceError> {
    let current = apikey::Entity::find_by_id(id)
        .filter(apikey::Column::BusinessId.eq(ctx.business_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("api key"))?;
    if current.status == STATUS_REVOKED {
        return Ok(current);
    }
    let mut am: apikey::ActiveModel = current.into();
    am.status = Set(STATUS_REVOKED.to_string());
    let revoked = am.update(db).await?;
    audit_service::record(db, ctx, "delete", "api_key", Some(id), serde_json::json!({ "prefix": revoked.key_prefix })).await;
    Ok(revoked)
}

/// 校验 `x-api-key`：未知、已吊销或过期返回 401，超过每分钟限额返回 429；
/// 通过后累加 request_count 并刷新 last_used_at。
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    limiter: &RateLimiter,
    raw_key: Option<&str>,
) -> Result<ApiKeyPrincipal, ServiceError> {
    let raw = raw_key.map(str::trim).filter(|k| !k.is_empty()).ok_or_else(|| ServiceError::Unauthorized("API key required".into()))?;
    let hash = sha256_hex(raw);
    let key = apikey::find_by_hash(db, &hash)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("invalid API key".into()))?;
    let now: DateTime<FixedOffset> = Utc::now().into();
    if !key.is_usable_at(now) {
        warn!(service = "api_keys", event = "api_key_rejected", prefix = %key.key_prefix, status = %key.status);
        let reason = if key.status == STATUS_ACTIVE { "API key expired" } else { "API key inactive" };
        return Err(ServiceError::Unauthorized(reason.into()));
    }

    let rate = limiter.check(&hash, key.rate_limit_per_minute.max(0) as u32).await;
    if !rate.allowed {
        return Err(ServiceError::RateLimited("rate limit exceeded".into()));
    }

    apikey::Entity::update_many()
        .col_expr(apikey::Column::RequestCount, Expr::col(apikey::Column::RequestCount).add(1))
        .col_expr(apikey::Column::LastUsedAt, Expr::value(now))
        .filter(apikey::Column::Id.eq(key.id))
        .exec(db)
        .await?;
    Ok(ApiKeyPrincipal { key, rate })
}
