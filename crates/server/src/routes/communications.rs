use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use common::pagination::Pagination;
use service::services::communication_service::{self, CommunicationInput, CommunicationQuery};

use crate::errors::ApiError;
use crate::extract::{ApiJson, Session};
use crate::routes::{success, success_page};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/communications", get(list).post(send))
        .route("/api/communications/:id", get(get_one))
}

#[utoipa::path(get, path = "/api/communications", tag = "communications", params(("customerId" = Option<Uuid>, Query, description = "Filter by customer"), ("bookingId" = Option<Uuid>, Query, description = "Filter by booking"), ("channel" = Option<String>, Query, description = "email | sms")), responses((status = 200, description = "Communications page")))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CommunicationQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, ApiError> {
    success_page("communications", communication_service::list_communications(&state.db, session.claims.bid, &query, page).await?)
}

/// 投递失败时仍返回 201，记录状态为 failed
#[utoipa::path(post, path = "/api/communications", tag = "communications", request_body = crate::openapi::CommunicationRequest, responses((status = 201, description = "Recorded (sent or failed)"), (status = 400, description = "Bad Request")))]
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<CommunicationInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let rec = communication_service::send_communication(&state.db, &state.hub, state.notifier.as_ref(), &session.ctx(), input).await?;
    Ok((StatusCode::CREATED, success("communication", rec)?))
}

#[utoipa::path(get, path = "/api/communications/{id}", tag = "communications", params(("id" = Uuid, Path, description = "Communication id")), responses((status = 200, description = "Communication"), (status = 404, description = "Not Found")))]
pub async fn get_one(State(state): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    success("communication", communication_service::get_communication(&state.db, session.claims.bid, id).await?)
}
