use std::env;
use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::AppConfig;

use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// `PLATFORM_ADMIN_EMAIL` / `PLATFORM_ADMIN_PASSWORD` 同时存在时创建或确认平台管理员
async fn bootstrap_platform_admin(state: &AppState) -> anyhow::Result<()> {
    let (Ok(email), Ok(password)) = (env::var("PLATFORM_ADMIN_EMAIL"), env::var("PLATFORM_ADMIN_PASSWORD")) else {
        return Ok(());
    };
    let admin = state.auth.ensure_platform_admin(&email, &password).await?;
    info!(service = "server", event = "platform_admin_ready", user_id = %admin.id, "platform admin ensured");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(service = "server", event = "signal_error", error = %e, "failed to listen for ctrl_c");
    }
    info!(service = "server", event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: connect, migrate, build the app and serve until Ctrl+C
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_and_migrate(&config.database).await?;
    let addr = bind_addr(&config)?;

    let state = AppState::new(db, config)?;
    bootstrap_platform_admin(&state).await?;

    let app = routes::build_router(state, build_cors());

    info!(service = "server", event = "listening", %addr, "starting http server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
