use uuid::Uuid;

/// 当前请求所属租户与操作者；审计日志使用 `actor`
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub business_id: Uuid,
    pub actor: String,
    pub ip_address: Option<String>,
}

impl TenantContext {
    pub fn new(business_id: Uuid, actor: impl Into<String>) -> Self {
        Self { business_id, actor: actor.into(), ip_address: None }
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    /// API Key 调用方
    pub fn api_key(business_id: Uuid, key_prefix: &str) -> Self {
        Self::new(business_id, format!("api_key:{}", key_prefix))
    }

    /// 公开预约组件
    pub fn widget(business_id: Uuid) -> Self {
        Self::new(business_id, "widget")
    }
}
