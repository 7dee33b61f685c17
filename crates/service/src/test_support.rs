#![cfg(test)]
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use migration::MigratorTrait;
use uuid::Uuid;

use models::{business, customer, service_template};
use models::schedule::{DaySchedule, TimeRange, WeeklyAvailability};

/// 每个测试独立的内存 SQLite，迁移已执行
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = models::db::connect_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// 工作日 08:00-17:00，12:00-13:00 午休
pub fn business_hours() -> WeeklyAvailability {
    let t = |h| chrono::NaiveTime::from_hms_opt(h, 0, 0).unwrap();
    WeeklyAvailability::weekdays(DaySchedule {
        enabled: true,
        slots: vec![TimeRange::new(t(8), t(17))],
        breaks: vec![TimeRange::new(t(12), t(13))],
    })
}

pub struct Fixture {
    pub business: business::Model,
    pub customer: customer::Model,
    pub service: service_template::Model,
}

/// 租户 + 客户 + 60 分钟、基础价 100 的服务
pub async fn seed(db: &DatabaseConnection) -> Result<Fixture, anyhow::Error> {
    let business = business::create(db, &format!("Biz {}", Uuid::new_v4()), None).await?;
    let customer = customer::create(
        db,
        business.id,
        customer::NewCustomer { name: "Pat".into(), email: "pat@example.com".into(), phone: Some("+15550100".into()), ..Default::default() },
    )
    .await?;
    let service = service_template::create(
        db,
        business.id,
        service_template::NewServiceTemplate {
            name: "Furnace Inspection".into(),
            base_price: 100.0,
            duration_minutes: 60,
            availability: business_hours(),
            ..Default::default()
        },
    )
    .await?;
    Ok(Fixture { business, customer, service })
}

/// 本地 webhook 接收端：`/ok` 记录请求体并返回 200，`/fail` 返回 500
pub struct WebhookReceiver {
    pub base_url: String,
    pub received: Arc<Mutex<Vec<serde_json::Value>>>,
}

pub async fn spawn_webhook() -> Result<WebhookReceiver, anyhow::Error> {
    let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::default();
    let app = Router::new()
        .route(
            "/ok",
            post(|State(log): State<Arc<Mutex<Vec<serde_json::Value>>>>, Json(body): Json<serde_json::Value>| async move {
                log.lock().await.push(body);
                StatusCode::OK
            }),
        )
        .route("/fail", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .with_state(received.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(WebhookReceiver { base_url: format!("http://{}", addr), received })
}
