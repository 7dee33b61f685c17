use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use common::pagination::Pagination;
use service::services::audit_service::{self, AuditFilter};
use service::services::{admin_service, business_service};

use crate::errors::ApiError;
use crate::extract::Session;
use crate::routes::{success, success_page};
use crate::state::AppState;

/// 平台管理员接口
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/businesses", get(businesses))
        .route("/admin/stats", get(stats))
        .route("/admin/audit-logs", get(audit_logs))
}

#[utoipa::path(get, path = "/admin/businesses", tag = "admin", responses((status = 200, description = "Businesses page"), (status = 403, description = "Platform admin only")))]
pub async fn businesses(State(state): State<AppState>, session: Session, Query(page): Query<Pagination>) -> Result<Json<Value>, ApiError> {
    session.require_platform_admin()?;
    success_page("businesses", business_service::list_businesses(&state.db, page).await?)
}

#[utoipa::path(get, path = "/admin/stats", tag = "admin", responses((status = 200, description = "Platform statistics"), (status = 403, description = "Platform admin only")))]
pub async fn stats(State(state): State<AppState>, session: Session) -> Result<Json<Value>, ApiError> {
    session.require_platform_admin()?;
    success("stats", admin_service::platform_stats(&state.db).await?)
}

#[utoipa::path(get, path = "/admin/audit-logs", tag = "admin", params(("businessId" = Option<uuid::Uuid>, Query, description = "Narrow to one business")), responses((status = 200, description = "Audit log page"), (status = 403, description = "Platform admin only")))]
pub async fn audit_logs(
    State(state): State<AppState>,
    session: Session,
    Query(filter): Query<AuditFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    session.require_platform_admin()?;
    success_page("auditLogs", audit_service::list_all(&state.db, &filter, page).await?)
}
