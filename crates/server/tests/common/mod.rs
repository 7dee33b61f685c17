#![allow(dead_code)]
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use configs::AppConfig;
use models::schedule::{DaySchedule, TimeRange, WeeklyAvailability};
use models::{business, service_template};
use server::routes;
use server::state::AppState;

pub const PASSWORD: &str = "S3curePass!";

pub async fn build_app() -> anyhow::Result<(Router, AppState)> {
    let db = models::db::connect_memory().await?;
    migration::Migrator::up(&db, None).await?;
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret-0123".into();
    let state = AppState::new(db, config)?;
    let app = routes::build_router(state.clone(), tower_http::cors::CorsLayer::very_permissive());
    Ok((app, state))
}

/// 发送请求并解析 JSON 响应体（空体返回 Null）
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
        req = req.header(*k, *v);
    }
    let req = match body {
        Some(b) => req.header("content-type", "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, json))
}

/// 原样发送请求体，用于构造非法 JSON
pub async fn send_raw(app: &Router, uri: &str, headers: &[(&str, &str)], body: &'static str) -> anyhow::Result<(StatusCode, Value)> {
    let mut req = Request::builder().method("POST").uri(uri).header("content-type", "application/json");
    for (k, v) in headers {
        req = req.header(*k, *v);
    }
    let resp = app.clone().oneshot(req.body(Body::from(body))?).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// 注册新企业 owner 并登录，返回 token
pub async fn owner_token(app: &Router) -> anyhow::Result<String> {
    let email = format!("owner_{}@example.com", Uuid::new_v4());
    let (status, _) = send(
        app,
        "POST",
        "/auth/register",
        &[],
        Some(serde_json::json!({ "email": email, "name": "Owner", "password": PASSWORD, "businessName": "Cool Air" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    login(app, &email, PASSWORD).await
}

pub async fn login(app: &Router, email: &str, password: &str) -> anyhow::Result<String> {
    let (status, body) = send(app, "POST", "/auth/login", &[], Some(serde_json::json!({ "email": email, "password": password }))).await?;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

/// 工作日 08:00-17:00
pub fn weekday_hours() -> WeeklyAvailability {
    let t = |h| chrono::NaiveTime::from_hms_opt(h, 0, 0).unwrap();
    WeeklyAvailability::weekdays(DaySchedule { enabled: true, slots: vec![TimeRange::new(t(8), t(17))], breaks: vec![] })
}

/// 直接写库创建企业与一个 60 分钟的服务
pub async fn seed_business(state: &AppState, slug: &str) -> anyhow::Result<(business::Model, service_template::Model)> {
    let biz = business::create(&state.db, "Widget HVAC", Some(slug)).await?;
    let svc = service_template::create(
        &state.db,
        biz.id,
        service_template::NewServiceTemplate {
            name: "AC Tune-up".into(),
            base_price: 120.0,
            duration_minutes: 60,
            availability: weekday_hours(),
            ..Default::default()
        },
    )
    .await?;
    Ok((biz, svc))
}
