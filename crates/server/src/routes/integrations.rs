//! `/v1`：外部系统通过 API Key 访问，调用方由中间件注入。
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::apikey_service::ApiKeyPrincipal;
use service::services::booking_service::{self, BookingInput, BookingQuery};
use service::services::catalog_service::{self, ServiceQuery};
use service::services::customer_service::{self, CustomerInput, CustomerQuery};
use service::services::invoice_service::{self, InvoiceQuery};

use crate::errors::ApiError;
use crate::extract::{ApiJson, api_key_context};
use crate::routes::bookings::created_body;
use crate::routes::{success, success_page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings).post(create_booking))
        .route("/v1/bookings/:id", get(get_booking))
        .route("/v1/customers", get(list_customers).post(create_customer))
        .route("/v1/customers/:id", get(get_customer))
        .route("/v1/services", get(list_services))
        .route("/v1/services/:id", get(get_service))
        .route("/v1/invoices", get(list_invoices))
        .route("/v1/invoices/:id", get(get_invoice))
}

#[utoipa::path(get, path = "/v1/bookings", tag = "v1", security(("api_key" = [])), responses((status = 200, description = "Bookings page"), (status = 401, description = "Invalid API key"), (status = 429, description = "Rate limited")))]
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(key): Extension<ApiKeyPrincipal>,
    Query(query): Query<BookingQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("bookings", booking_service::list_bookings(&state.db, key.key.business_id, &query, page).await?)
}

#[utoipa::path(post, path = "/v1/bookings", tag = "v1", security(("api_key" = [])), request_body = crate::openapi::BookingRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Slot unavailable")))]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(key): Extension<ApiKeyPrincipal>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<BookingInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let ctx = api_key_context(&key, &headers);
    let out = booking_service::create_booking(&state.db, &state.hub, &state.config.booking, &ctx, input, Utc::now().naive_utc()).await?;
    created_body(out)
}

#[utoipa::path(get, path = "/v1/bookings/{id}", tag = "v1", security(("api_key" = [])), params(("id" = Uuid, Path, description = "Booking id")), responses((status = 200, description = "Booking"), (status = 404, description = "Not Found")))]
pub async fn get_booking(State(state): State<AppState>, Extension(key): Extension<ApiKeyPrincipal>, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("booking", booking_service::get_booking(&state.db, key.key.business_id, id).await?)
}

#[utoipa::path(get, path = "/v1/customers", tag = "v1", security(("api_key" = [])), responses((status = 200, description = "Customers page")))]
pub async fn list_customers(
    State(state): State<AppState>,
    Extension(key): Extension<ApiKeyPrincipal>,
    Query(query): Query<CustomerQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("customers", customer_service::list_customers(&state.db, key.key.business_id, &query, page).await?)
}

#[utoipa::path(post, path = "/v1/customers", tag = "v1", security(("api_key" = [])), request_body = crate::openapi::CustomerRequest, responses((status = 201, description = "Created"), (status = 409, description = "Duplicate email")))]
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(key): Extension<ApiKeyPrincipal>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = customer_service::create_customer(&state.db, &api_key_context(&key, &headers), input).await?;
    Ok((StatusCode::CREATED, success("customer", created)?))
}

#[utoipa::path(get, path = "/v1/customers/{id}", tag = "v1", security(("api_key" = [])), params(("id" = Uuid, Path, description = "Customer id")), responses((status = 200, description = "Customer"), (status = 404, description = "Not Found")))]
pub async fn get_customer(State(state): State<AppState>, Extension(key): Extension<ApiKeyPrincipal>, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("customer", customer_service::get_customer(&state.db, key.key.business_id, id).await?)
}

#[utoipa::path(get, path = "/v1/services", tag = "v1", security(("api_key" = [])), responses((status = 200, description = "Services page")))]
pub async fn list_services(
    State(state): State<AppState>,
    Extension(key): Extension<ApiKeyPrincipal>,
    Query(query): Query<ServiceQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("services", catalog_service::list_services(&state.db, key.key.business_id, &query, page).await?)
}

#[utoipa::path(get, path = "/v1/services/{id}", tag = "v1", security(("api_key" = [])), params(("id" = Uuid, Path, description = "Service id")), responses((status = 200, description = "Service"), (status = 404, description = "Not Found")))]
pub async fn get_service(State(state): State<AppState>, Extension(key): Extension<ApiKeyPrincipal>, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("service", catalog_service::get_service(&state.db, key.key.business_id, id).await?)
}

#[utoipa::path(get, path = "/v1/invoices", tag = "v1", security(("api_key" = [])), responses((status = 200, description = "Invoices page")))]
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(key): Extension<ApiKeyPrincipal>,
    Query(query): Query<InvoiceQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("invoices", invoice_service::list_invoices(&state.db, key.key.business_id, &query, page).await?)
}

#[utoipa::path(get, path = "/v1/invoices/{id}", tag = "v1", security(("api_key" = [])), params(("id" = Uuid, Path, description = "Invoice id")), responses((status = 200, description = "Invoice"), (status = 404, description = "Not Found")))]
pub async fn get_invoice(State(state): State<AppState>, Extension(key): Extension<ApiKeyPrincipal>, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("invoice", invoice_service::get_invoice(&state.db, key.key.business_id, id).await?)
}
