use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::invoice_service::{self, InvoiceInput, InvoiceQuery, InvoiceUpdate};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session};
use crate::routes::{success, success_page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", get(list).post(create))
        .route("/api/invoices/:id", get(get_one).put(update).delete(remove))
}

#[utoipa::path(get, path = "/api/invoices", tag = "invoices", params(("status" = Option<String>, Query, description = "Filter by status"), ("customerId" = Option<Uuid>, Query, description = "Filter by customer"), ("page" = Option<u32>, Query, description = "1-based page"), ("perPage" = Option<u32>, Query, description = "1..=100")), responses((status = 200, description = "Invoices page")))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<InvoiceQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("invoices", invoice_service::list_invoices(&state.db, session.claims.bid, &query, page).await?)
}

#[utoipa::path(post, path = "/api/invoices", tag = "invoices", request_body = crate::openapi::InvoiceRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request")))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<InvoiceInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = invoice_service::create_invoice(&state.db, &state.hub, &session.ctx(), input).await?;
    Ok((StatusCode::CREATED, success("invoice", created)?))
}

#[utoipa::path(get, path = "/api/invoices/{id}", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 200, description = "Invoice"), (status = 404, description = "Not Found")))]
pub async fn get_one(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("invoice", invoice_service::get_invoice(&state.db, session.claims.bid, id).await?)
}

#[utoipa::path(put, path = "/api/invoices/{id}", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), request_body = crate::openapi::InvoiceUpdateRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Illegal status transition")))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<InvoiceUpdate>,
) -> Result<Json<Value>, ApiError> {
    success("invoice", invoice_service::update_invoice(&state.db, &state.hub, &session.ctx(), id, input).await?)
}

#[utoipa::path(delete, path = "/api/invoices/{id}", tag = "invoices", params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 204, description = "Deleted"), (status = 409, description = "Only draft or cancelled invoices can be deleted")))]
pub async fn remove(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    invoice_service::delete_invoice(&state.db, &state.hub, &session.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
