use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::booking_service::{self, BookingInput, BookingQuery, BookingUpdate, CreatedBooking};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session};
use crate::routes::{success, success_page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list).post(create))
        .route("/api/bookings/:id", get(get_one).put(update).delete(remove))
}

/// `{"success": true, "booking": ..., "invoice": ..., "price": ...}`
pub(crate) fn created_body(out: CreatedBooking) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(mut body) = success("booking", out.booking)?;
    if let Value::Object(map) = &mut body {
        map.insert("invoice".into(), serde_json::to_value(out.invoice).map_err(ApiError::internal)?);
        map.insert("price".into(), serde_json::to_value(out.price).map_err(ApiError::internal)?);
    }
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(get, path = "/api/bookings", tag = "bookings", params(("status" = Option<String>, Query, description = "Filter by status"), ("date" = Option<String>, Query, description = "YYYY-MM-DD"), ("customerId" = Option<Uuid>, Query, description = "Filter by customer"), ("page" = Option<u32>, Query, description = "1-based page"), ("perPage" = Option<u32>, Query, description = "1..=100")), responses((status = 200, description = "Bookings page"), (status = 401, description = "Unauthorized")))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BookingQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    let page = booking_service::list_bookings(&state.db, session.claims.bid, &query, page).await?;
    success_page("bookings", page)
}

#[utoipa::path(post, path = "/api/bookings", tag = "bookings", request_body = crate::openapi::BookingRequest, responses((status = 201, description = "Created"), (status = 400, description = "Missing serviceId, date or startTime"), (status = 409, description = "Slot unavailable or already booked")))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<BookingInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let out = booking_service::create_booking(
        &state.db,
        &state.hub,
        &state.config.booking,
        &session.ctx(),
        input,
        Utc::now().naive_utc(),
    )
    .await?;
    created_body(out)
}

#[utoipa::path(get, path = "/api/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), responses((status = 200, description = "Booking"), (status = 404, description = "Not Found")))]
pub async fn get_one(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("booking", booking_service::get_booking(&state.db, session.claims.bid, id).await?)
}

#[utoipa::path(put, path = "/api/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), request_body = crate::openapi::BookingUpdateRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Illegal status transition"), (status = 404, description = "Not Found"), (status = 409, description = "Slot unavailable")))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<BookingUpdate>,
) -> Result<Json<Value>, ApiError> {
    let updated = booking_service::update_booking(&state.db, &state.hub, &session.ctx(), id, input, Utc::now().naive_utc()).await?;
    success("booking", updated)
}

#[utoipa::path(delete, path = "/api/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn remove(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    booking_service::delete_booking(&state.db, &state.hub, &session.ctx(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
