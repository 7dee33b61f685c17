use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::tracking_service::{self, TrackingInput, TrackingQuery};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session};
use crate::routes::{success, success_page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/service-tracking", get(list).post(create))
        .route("/api/service-tracking/:id", get(get_one).put(update))
}

#[utoipa::path(get, path = "/api/service-tracking", tag = "tracking", params(("bookingId" = Option<Uuid>, Query, description = "Filter by booking"), ("status" = Option<String>, Query, description = "Filter by status")), responses((status = 200, description = "Tracking page")))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TrackingQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("tracking", tracking_service::list_tracking(&state.db, session.claims.bid, &query, page).await?)
}

#[utoipa::path(post, path = "/api/service-tracking", tag = "tracking", request_body = crate::openapi::TrackingRequest, responses((status = 201, description = "Created"), (status = 409, description = "Booking already tracked")))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<TrackingInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = tracking_service::create_tracking(&state.db, &state.hub, &session.ctx(), input).await?;
    Ok((StatusCode::CREATED, success("tracking", created)?))
}

#[utoipa::path(get, path = "/api/service-tracking/{id}", tag = "tracking", params(("id" = Uuid, Path, description = "Tracking id")), responses((status = 200, description = "Tracking"), (status = 404, description = "Not Found")))]
pub async fn get_one(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("tracking", tracking_service::get_tracking(&state.db, session.claims.bid, id).await?)
}

#[utoipa::path(put, path = "/api/service-tracking/{id}", tag = "tracking", params(("id" = Uuid, Path, description = "Tracking id")), request_body = crate::openapi::TrackingRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Status may only move forward")))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<TrackingInput>,
) -> Result<Json<Value>, ApiError> {
    success("tracking", tracking_service::update_tracking(&state.db, &state.hub, &session.ctx(), id, input).await?)
}
