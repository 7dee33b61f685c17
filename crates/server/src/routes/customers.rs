use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::customer_service::{self, CustomerInput, CustomerQuery};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session};
use crate::routes::{success, success_page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list).post(create))
        .route("/api/customers/:id", get(get_one).put(update).delete(remove))
}

#[utoipa::path(get, path = "/api/customers", tag = "customers", params(("search" = Option<String>, Query, description = "Name or email contains"), ("page" = Option<u32>, Query, description = "1-based page"), ("perPage" = Option<u32>, Query, description = "1..=100")), responses((status = 200, description = "Customers page")))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CustomerQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("customers", customer_service::list_customers(&state.db, session.claims.bid, &query, page).await?)
}

#[utoipa::path(post, path = "/api/customers", tag = "customers", request_body = crate::openapi::CustomerRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Duplicate email")))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = customer_service::create_customer(&state.db, &session.ctx(), input).await?;
    Ok((StatusCode::CREATED, success("customer", created)?))
}

#[utoipa::path(get, path = "/api/customers/{id}", tag = "customers", params(("id" = Uuid, Path, description = "Customer id")), responses((status = 200, description = "Customer"), (status = 404, description = "Not Found")))]
pub async fn get_one(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("customer", customer_service::get_customer(&state.db, session.claims.bid, id).await?)
}

#[utoipa::path(put, path = "/api/customers/{id}", tag = "customers", params(("id" = Uuid, Path, description = "Customer id")), request_body = crate::openapi::CustomerRequest, responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 409, description = "Duplicate email")))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<Json<Value>, ApiError> {
    success("customer", customer_service::update_customer(&state.db, &session.ctx(), id, input).await?)
}

#[utoipa::path(delete, path = "/api/customers/{id}", tag = "customers", params(("id" = Uuid, Path, description = "Customer id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn remove(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    customer_service::delete_customer(&state.db, &session.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
