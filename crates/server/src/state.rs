use std::sync::Arc;

use sea_orm::DatabaseConnection;

use configs::AppConfig;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::AuthConfig;
use service::auth::AuthService;
use service::notifications::{sender_from_config, NotificationSender};
use service::rate_limiter::RateLimiter;
use service::realtime::EventHub;

/// 所有 handler 共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub limiter: RateLimiter,
    pub hub: EventHub,
    pub notifier: Arc<dyn NotificationSender>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> anyhow::Result<Self> {
        let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
        let auth = Arc::new(AuthService::new(repo, AuthConfig::from_config(&config.auth)));
        let limiter = RateLimiter::from_config(&config.rate_limit);
        let notifier = sender_from_config(&config.notifications)?;
        Ok(Self {
            db,
            config: Arc::new(config),
            auth,
            limiter,
            hub: EventHub::default(),
            notifier,
        })
    }
}
