use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// 日志输出格式：compact 或 json
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), log_format: default_log_format() }
    }
}

fn default_log_format() -> String { "compact".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// 启动时自动执行迁移
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Cookie 是否带 Secure 标记（生产环境开启）
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl_hours(), secure_cookie: false }
    }
}

fn default_token_ttl_hours() -> i64 { 24 }

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// 新建 API Key 的默认每分钟请求上限
    #[serde(default = "default_per_minute")]
    pub default_per_minute: u32,
    /// 计数表最多跟踪的 key 数量
    #[serde(default = "default_max_tracked_keys")]
    pub max_tracked_keys: u64,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_per_minute: default_per_minute(),
            max_tracked_keys: default_max_tracked_keys(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_per_minute() -> u32 { 60 }
fn default_max_tracked_keys() -> u64 { 10_000 }
fn default_window_secs() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// 创建预约时同时生成草稿发票
    #[serde(default = "default_true")]
    pub auto_invoice: bool,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default = "default_invoice_due_days")]
    pub invoice_due_days: i64,
    /// 可选时段步长；为空时按服务时长步进
    #[serde(default)]
    pub slot_interval_minutes: Option<u32>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self { auto_invoice: true, tax_rate: 0.0, invoice_due_days: default_invoice_due_days(), slot_interval_minutes: None }
    }
}

fn default_invoice_due_days() -> i64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// log | webhook
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { provider: default_provider(), webhook_url: None, timeout_secs: default_webhook_timeout() }
    }
}

fn default_provider() -> String { "log".into() }
fn default_webhook_timeout() -> u64 { 10 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !std::path::Path::new(&path).exists() {
        // 无配置文件时完全依赖默认值与环境变量
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server（环境变量优先于文件）
        self.server.normalize_from_env();
        self.server.normalize()?;
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.rate_limit.validate()?;
        self.booking.validate()?;
        self.notifications.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() { self.host = host; }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|w| w.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        match self.log_format.as_str() {
            "compact" | "json" => {}
            other => return Err(anyhow!("server.log_format 不支持: {}（可选 compact/json）", other)),
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url 为空；请在 config.toml 或环境变量 DATABASE_URL 中提供"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url 必须以 postgresql://、postgres:// 或 sqlite: 开头"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections 必须 >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections 必须 >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database 超时配置必须为正整数秒"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 16 {
            return Err(anyhow!("auth.jwt_secret 至少 16 个字符；可通过环境变量 JWT_SECRET 提供"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours 必须 > 0"));
        }
        Ok(())
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_per_minute == 0 {
            return Err(anyhow!("rate_limit.default_per_minute 必须 >= 1"));
        }
        if self.max_tracked_keys == 0 || self.window_secs == 0 {
            return Err(anyhow!("rate_limit.max_tracked_keys 与 window_secs 必须为正数"));
        }
        Ok(())
    }
}

impl BookingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(anyhow!("booking.tax_rate 必须在 0..=1 之间"));
        }
        if self.invoice_due_days < 0 {
            return Err(anyhow!("booking.invoice_due_days 不能为负数"));
        }
        if matches!(self.slot_interval_minutes, Some(0)) {
            return Err(anyhow!("booking.slot_interval_minutes 必须 >= 1"));
        }
        Ok(())
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<()> {
        match self.provider.as_str() {
            "log" => Ok(()),
            "webhook" => {
                let url = self.webhook_url.as_deref().unwrap_or("");
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(anyhow!("notifications.webhook_url 必须是 http(s) 地址"));
                }
                Ok(())
            }
            other => Err(anyhow!("notifications.provider 不支持: {}（可选 log/webhook）", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
host = "0.0.0.0"
port = 9000

[database]
url = "sqlite::memory:"
min_connections = 1
max_connections = 1

[auth]
jwt_secret = "0123456789abcdef0123"

[booking]
tax_rate = 0.08
slot_interval_minutes = 30
"#;

    #[test]
    fn parses_sections_with_defaults() {
        let cfg = load_from_str(SAMPLE).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.log_format, "compact");
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.rate_limit.default_per_minute, 60);
        assert_eq!(cfg.booking.slot_interval_minutes, Some(30));
        assert!(cfg.booking.auto_invoice);
        assert_eq!(cfg.notifications.provider, "log");
    }

    #[test]
    fn validates_sample() {
        let mut cfg = load_from_str(SAMPLE).unwrap();
        cfg.database.validate().unwrap();
        cfg.auth.validate().unwrap();
        cfg.booking.validate().unwrap();
        cfg.server.normalize().unwrap();
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn rejects_unknown_database_scheme() {
        let db = DatabaseConfig { url: "mysql://localhost/x".into(), ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_short_jwt_secret() {
        let auth = AuthConfig { jwt_secret: "short".into(), ..Default::default() };
        assert!(auth.validate().is_err());
    }

    #[test]
    fn webhook_provider_requires_url() {
        let mut n = NotificationConfig { provider: "webhook".into(), ..Default::default() };
        assert!(n.validate().is_err());
        n.webhook_url = Some("https://hooks.example.com/notify".into());
        assert!(n.validate().is_ok());
        n.provider = "pigeon".into();
        assert!(n.validate().is_err());
    }

    #[test]
    fn tax_rate_out_of_range() {
        let b = BookingConfig { tax_rate: 1.5, ..Default::default() };
        assert!(b.validate().is_err());
    }
}
