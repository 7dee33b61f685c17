use std::convert::Infallible;

use axum::extract::State;
use axum::middleware;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_stream::{Stream, StreamExt};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::services::Page;

use crate::errors::ApiError;
use crate::extract::{self, Session};
use crate::observability;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod admin;
pub mod api_keys;
pub mod audit;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod communications;
pub mod customers;
pub mod integrations;
pub mod invoices;
pub mod refunds;
pub mod tracking;
pub mod widget;

/// `{"success": true, "<key>": value}`
pub(crate) fn success<T: Serialize>(key: &str, value: T) -> Result<Json<Value>, ApiError> {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    body.insert(key.into(), serde_json::to_value(value).map_err(ApiError::internal)?);
    Ok(Json(Value::Object(body)))
}

/// 列表响应：`{"success": true, "<key>": [...], "pageInfo": {...}}`
pub(crate) fn success_page<T: Serialize>(key: &str, page: Page<T>) -> Result<Json<Value>, ApiError> {
    let Json(mut body) = success(key, page.items)?;
    if let Value::Object(map) = &mut body {
        map.insert("pageInfo".into(), serde_json::to_value(page.page_info).map_err(ApiError::internal)?);
    }
    Ok(Json(body))
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok", service: "hvac-platform" })
}

#[utoipa::path(get, path = "/metrics", tag = "health", responses((status = 200, description = "Prometheus text format")))]
pub async fn metrics() -> (axum::http::StatusCode, String) {
    observability::encode_metrics()
}

/// 当前租户的变更事件（SSE）
#[utoipa::path(get, path = "/api/realtime", tag = "realtime", responses((status = 200, description = "text/event-stream of change events"), (status = 401, description = "Unauthorized")))]
pub async fn realtime(State(state): State<AppState>, session: Session) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let business_id = session.claims.bid;
    let stream = state.hub.subscribe_business(business_id).map(move |ev| {
        let event = Event::default().event(ev.table).json_data(&ev).unwrap_or_else(|e| {
            warn!(%business_id, error = %e, "realtime event encode failed");
            Event::default().comment("encode error")
        });
        Ok(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Build the full application router: public, dashboard (session), integrations (API key), widget and admin.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    // Public routes (health, metrics, docs)
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Dashboard API: handlers take a `Session`
    let dashboard = Router::new()
        .merge(bookings::router())
        .merge(customers::router())
        .merge(catalog::router())
        .merge(invoices::router())
        .merge(refunds::router())
        .merge(communications::router())
        .merge(tracking::router())
        .merge(api_keys::router())
        .merge(audit::router())
        .route("/api/realtime", get(realtime));

    // External integrations guarded by x-api-key
    let v1 = integrations::router().route_layer(middleware::from_fn_with_state(state.clone(), extract::require_api_key));

    // Compose
    public
        .merge(auth::router())
        .merge(dashboard)
        .merge(v1)
        .merge(widget::router())
        .merge(admin::router())
        .with_state(state)
        .layer(middleware::from_fn(observability::track_http))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 请求到达时打点
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
