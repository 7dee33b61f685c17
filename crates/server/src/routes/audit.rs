use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use common::pagination::Pagination;
use service::services::audit_service::{self, AuditFilter};

use crate::errors::ApiError;
use crate::extract::Session;
use crate::routes::success_page;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/audit-logs", get(list))
}

#[utoipa::path(get, path = "/api/audit-logs", tag = "audit", params(("entityType" = Option<String>, Query, description = "e.g. booking"), ("action" = Option<String>, Query, description = "create | update | delete")), responses((status = 200, description = "Audit log page")))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(filter): Query<AuditFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("auditLogs", audit_service::list_for_business(&state.db, session.claims.bid, &filter, page).await?)
}
