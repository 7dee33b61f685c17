use common::pagination::Pagination;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::warn;
use uuid::Uuid;

use models::audit_log;

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::services::{fetch_page, Page};

/// 写审计日志；失败只记录告警，不影响业务请求
pub async fn record<C: ConnectionTrait>(
    db: &C,
    ctx: &TenantContext,
    action: &str,
    entity_type: &str,
    entity_id: Option<Uuid>,
    details: serde_json::Value,
) {
    let entry = audit_log::NewAuditLog {
        business_id: Some(ctx.business_id),
        actor: ctx.actor.clone(),
        action: action.to_string(),
        entity_type: entity_type.to_string(),
        entity_id,
        details,
        ip_address: ctx.ip_address.clone(),
    };
    if let Err(e) = audit_log::insert(db, entry).await {
        warn!(service = "audit", event = "audit_write_failed", entity_type, action, error = %e);
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    pub action: Option<String>,
    pub business_id: Option<Uuid>,
}

fn filtered(filter: &AuditFilter) -> sea_orm::Select<audit_log::Entity> {
    let mut q = audit_log::Entity::find().order_by_desc(audit_log::Column::CreatedAt);
    if let Some(t) = &filter.entity_type {
        q = q.filter(audit_log::Column::EntityType.eq(t.clone()));
    }
    if let Some(a) = &filter.action {
        q = q.filter(audit_log::Column::Action.eq(a.clone()));
    }
    q
}

/// List audit logs of one business, newest first.
pub async fn list_for_business<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    filter: &AuditFilter,
    opts: Pagination,
) -> Result<Page<audit_log::Model>, ServiceError> {
    let q = filtered(filter).filter(audit_log::Column::BusinessId.eq(business_id));
    fetch_page(db, q, opts).await
}

/// Platform-wide listing; `filter.business_id` narrows to one tenant.
pub async fn list_all<C: ConnectionTrait>(
    db: &C,
    filter: &AuditFilter,
    opts: Pagination,
) -> Result<Page<audit_log::Model>, ServiceError> {
    let mut q = filtered(filter);
    if let Some(bid) = filter.business_id {
        q = q.filter(audit_log::Column::BusinessId.eq(bid));
    }
    fetch_page(db, q, opts).await
}
