use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::catalog_service::{self, QuoteInput, ServiceInput, ServiceQuery};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session};
use crate::routes::{success, success_page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/services", get(list).post(create))
        .route("/api/services/:id", get(get_one).put(update).delete(remove))
        .route("/api/services/:id/availability", get(availability))
        .route("/api/services/:id/quote", post(quote))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    /// 覆盖配置中的时段步长（分钟）
    pub step: Option<u32>,
}

/// 看板与组件共用：返回 `{"success": true, "availability": {...}}`
pub(crate) async fn availability_body(
    state: &AppState,
    business_id: Uuid,
    service_id: Uuid,
    query: AvailabilityQuery,
) -> Result<Json<Value>, ApiError> {
    let step = query.step.or(state.config.booking.slot_interval_minutes);
    let day = catalog_service::day_availability(
        &state.db,
        business_id,
        service_id,
        query.date.as_deref(),
        step,
        Utc::now().naive_utc(),
    )
    .await?;
    success("availability", day)
}

#[utoipa::path(get, path = "/api/services", tag = "services", params(("active" = Option<bool>, Query, description = "Only active or inactive"), ("category" = Option<String>, Query, description = "Category"), ("page" = Option<u32>, Query, description = "1-based page"), ("perPage" = Option<u32>, Query, description = "1..=100")), responses((status = 200, description = "Services page")))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ServiceQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("services", catalog_service::list_services(&state.db, session.claims.bid, &query, page).await?)
}

#[utoipa::path(post, path = "/api/services", tag = "services", request_body = crate::openapi::ServiceRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request")))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<ServiceInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = catalog_service::create_service(&state.db, &session.ctx(), input).await?;
    Ok((StatusCode::CREATED, success("service", created)?))
}

#[utoipa::path(get, path = "/api/services/{id}", tag = "services", params(("id" = Uuid, Path, description = "Service id")), responses((status = 200, description = "Service"), (status = 404, description = "Not Found")))]
pub async fn get_one(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("service", catalog_service::get_service(&state.db, session.claims.bid, id).await?)
}

#[utoipa::path(put, path = "/api/services/{id}", tag = "services", params(("id" = Uuid, Path, description = "Service id")), request_body = crate::openapi::ServiceRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Bad Request"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<ServiceInput>,
) -> Result<Json<Value>, ApiError> {
    success("service", catalog_service::update_service(&state.db, &session.ctx(), id, input).await?)
}

#[utoipa::path(delete, path = "/api/services/{id}", tag = "services", params(("id" = Uuid, Path, description = "Service id")), responses((status = 204, description = "Deleted"), (status = 409, description = "Service has bookings")))]
pub async fn remove(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    catalog_service::delete_service(&state.db, &session.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/services/{id}/availability", tag = "services", params(("id" = Uuid, Path, description = "Service id"), ("date" = String, Query, description = "YYYY-MM-DD"), ("step" = Option<u32>, Query, description = "Slot step in minutes")), responses((status = 200, description = "Open slots"), (status = 400, description = "date is required")))]
pub async fn availability(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, ApiError> {
    availability_body(&state, session.claims.bid, id, query).await
}

#[utoipa::path(post, path = "/api/services/{id}/quote", tag = "services", params(("id" = Uuid, Path, description = "Service id")), request_body = crate::openapi::QuoteRequest, responses((status = 200, description = "Price quote")))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<QuoteInput>,
) -> Result<Json<Value>, ApiError> {
    success("quote", catalog_service::quote(&state.db, session.claims.bid, id, input).await?)
}
