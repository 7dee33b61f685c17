use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, warn};

/// 单个 key 一次检查的结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub count: u32,
    pub limit: u32,
}

impl RateDecision {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

/// 按 API Key 计数的固定窗口限流表。
///
/// 容量有上限；每个计数器在创建一个窗口之后过期，下次请求重新计数。
#[derive(Clone)]
pub struct RateLimiter {
    counters: Cache<String, Arc<AtomicU32>>,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_tracked_keys: u64, window: Duration) -> Self {
        let counters = Cache::builder()
            .max_capacity(max_tracked_keys)
            .time_to_live(window)
            .build();
        Self { counters, window }
    }

    pub fn from_config(cfg: &configs::RateLimitConfig) -> Self {
        Self::new(cfg.max_tracked_keys, Duration::from_secs(cfg.window_secs))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// 计数并判断是否超过 `limit`
    pub async fn check(&self, key: &str, limit: u32) -> RateDecision {
        let counter = self
            .counters
            .get_with(key.to_string(), async { Arc::new(AtomicU32::new(0)) })
            .await;
        let count = counter.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        let allowed = count <= limit;
        if allowed {
            debug!(key_prefix = %prefix(key), count, limit, "rate limit check passed");
        } else {
            warn!(key_prefix = %prefix(key), count, limit, "rate limit exceeded");
        }
        RateDecision { allowed, count, limit }
    }

    /// 当前跟踪的 key 数量（近似值）
    pub fn tracked_keys(&self) -> u64 {
        self.counters.entry_count()
    }

    pub async fn run_pending_tasks(&self) {
        self.counters.run_pending_tasks().await;
    }
}

fn prefix(key: &str) -> &str {
    key.get(..8).unwrap_or(key)
}
