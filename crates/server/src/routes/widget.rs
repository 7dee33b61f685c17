//! 公开预约组件：按企业 slug 访问，无需登录。
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::context::TenantContext;
use service::services::booking_service::{self, BookingInput};
use service::services::catalog_service::{self, ServiceQuery};
use service::services::business_service;

use crate::errors::ApiError;
use crate::extract::{ApiJson, client_ip};
use crate::routes::bookings::created_body;
use crate::routes::catalog::{availability_body, AvailabilityQuery};
use crate::routes::success_page;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/widget/:slug/services", get(services))
        .route("/widget/:slug/services/:id/availability", get(availability))
        .route("/widget/:slug/bookings", post(book))
}

#[utoipa::path(get, path = "/widget/{slug}/services", tag = "widget", params(("slug" = String, Path, description = "Business slug")), responses((status = 200, description = "Active services"), (status = 404, description = "Unknown business")))]
pub async fn services(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Value>, ApiError> {
    let business = business_service::get_by_slug(&state.db, &slug).await?;
    let query = ServiceQuery { active: Some(true), ..Default::default() };
    let page = Pagination { page: 1, per_page: 100 };
    success_page("services", catalog_service::list_services(&state.db, business.id, &query, page).await?)
}

#[utoipa::path(get, path = "/widget/{slug}/services/{id}/availability", tag = "widget", params(("slug" = String, Path, description = "Business slug"), ("id" = Uuid, Path, description = "Service id"), ("date" = String, Query, description = "YYYY-MM-DD")), responses((status = 200, description = "Open slots"), (status = 404, description = "Not Found")))]
pub async fn availability(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, ApiError> {
    let business = business_service::get_by_slug(&state.db, &slug).await?;
    availability_body(&state, business.id, id, query).await
}

/// 客户由请求体中的 `customer` 按邮箱查找或创建，不接受 customerId
#[utoipa::path(post, path = "/widget/{slug}/bookings", tag = "widget", params(("slug" = String, Path, description = "Business slug")), request_body = crate::openapi::BookingRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Slot unavailable")))]
pub async fn book(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    ApiJson(mut input): ApiJson<BookingInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let business = business_service::get_by_slug(&state.db, &slug).await?;
    input.customer_id = None;
    if input.customer.is_none() {
        return Err(ApiError::BadRequest("customer is required".into()));
    }
    let ctx = TenantContext::widget(business.id).with_ip(client_ip(&headers));
    let out = booking_service::create_booking(&state.db, &state.hub, &state.config.booking, &ctx, input, Utc::now().naive_utc()).await?;
    created_body(out)
}
