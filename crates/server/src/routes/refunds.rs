use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::refund_service::{self, RefundInput, RefundQuery, RefundUpdate};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session};
use crate::routes::{success, success_page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/refunds", get(list).post(create))
        .route("/api/refunds/:id", get(get_one).put(update))
}

#[utoipa::path(get, path = "/api/refunds", tag = "refunds", params(("invoiceId" = Option<Uuid>, Query, description = "Filter by invoice"), ("status" = Option<String>, Query, description = "Filter by status")), responses((status = 200, description = "Refunds page")))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RefundQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("refunds", refund_service::list_refunds(&state.db, session.claims.bid, &query, page).await?)
}

#[utoipa::path(post, path = "/api/refunds", tag = "refunds", request_body = crate::openapi::RefundRequest, responses((status = 201, description = "Created"), (status = 400, description = "Amount invalid or invoice not refundable")))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<RefundInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = refund_service::create_refund(&state.db, &state.hub, &session.ctx(), input).await?;
    Ok((StatusCode::CREATED, success("refund", created)?))
}

#[utoipa::path(get, path = "/api/refunds/{id}", tag = "refunds", params(("id" = Uuid, Path, description = "Refund id")), responses((status = 200, description = "Refund"), (status = 404, description = "Not Found")))]
pub async fn get_one(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("refund", refund_service::get_refund(&state.db, session.claims.bid, id).await?)
}

#[utoipa::path(put, path = "/api/refunds/{id}", tag = "refunds", params(("id" = Uuid, Path, description = "Refund id")), request_body = crate::openapi::StatusRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Illegal status transition")))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<RefundUpdate>,
) -> Result<Json<Value>, ApiError> {
    success("refund", refund_service::update_refund(&state.db, &state.hub, &session.ctx(), id, input).await?)
}
