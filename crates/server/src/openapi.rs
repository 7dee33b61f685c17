use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// 首个注册者创建企业；已登录 owner 调用时邀请成员
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub business_name: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_id: Uuid,
    /// 看板与 API 使用；组件请求中被忽略
    pub customer_id: Option<Uuid>,
    /// 按邮箱查找或创建客户
    pub customer: Option<CustomerRequest>,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub start_time: String,
    pub is_emergency: Option<bool>,
    pub notes: Option<String>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct BookingUpdateRequest {
    /// pending | pending_approval | confirmed | in_progress | completed | cancelled
    pub status: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub notes: Option<String>,
}

/// `availability`、`schedulingRules`、`pricingRules` 为 JSON 对象
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub base_price: Option<f64>,
    pub duration_minutes: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub availability: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub scheduling_rules: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub pricing_rules: Option<serde_json::Value>,
    pub active: Option<bool>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub date: String,
    pub start_time: String,
    pub is_emergency: Option<bool>,
    pub customer_id: Option<Uuid>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub customer_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount: f64,
    pub tax_amount: Option<f64>,
    pub due_date: Option<String>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct InvoiceUpdateRequest {
    /// draft | sent | paid | overdue | cancelled
    pub status: Option<String>,
    pub amount: Option<f64>,
    pub tax_amount: Option<f64>,
    pub due_date: Option<String>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct RefundRequest {
    pub invoice_id: Uuid,
    pub amount: f64,
    pub reason: Option<String>,
}

#[derive(ToSchema)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CommunicationRequest {
    pub customer_id: Uuid,
    pub booking_id: Option<Uuid>,
    /// email | sms
    pub channel: String,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct TrackingRequest {
    pub booking_id: Option<Uuid>,
    /// scheduled | en_route | on_site | in_progress | completed
    pub status: Option<String>,
    pub technician_name: Option<String>,
    pub notes: Option<String>,
    pub eta: Option<String>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ApiKeyRequest {
    pub name: String,
    pub rate_limit_per_minute: Option<i32>,
    pub expires_at: Option<String>,
}

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(crate::extract::API_KEY_HEADER))),
            );
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::metrics,
        crate::routes::realtime,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::bookings::list,
        crate::routes::bookings::create,
        crate::routes::bookings::get_one,
        crate::routes::bookings::update,
        crate::routes::bookings::remove,
        crate::routes::customers::list,
        crate::routes::customers::create,
        crate::routes::customers::get_one,
        crate::routes::customers::update,
        crate::routes::customers::remove,
        crate::routes::catalog::list,
        crate::routes::catalog::create,
        crate::routes::catalog::get_one,
        crate::routes::catalog::update,
        crate::routes::catalog::remove,
        crate::routes::catalog::availability,
        crate::routes::catalog::quote,
        crate::routes::invoices::list,
        crate::routes::invoices::create,
        crate::routes::invoices::get_one,
        crate::routes::invoices::update,
        crate::routes::invoices::remove,
        crate::routes::refunds::list,
        crate::routes::refunds::create,
        crate::routes::refunds::get_one,
        crate::routes::refunds::update,
        crate::routes::communications::list,
        crate::routes::communications::send,
        crate::routes::communications::get_one,
        crate::routes::tracking::list,
        crate::routes::tracking::create,
        crate::routes::tracking::get_one,
        crate::routes::tracking::update,
        crate::routes::api_keys::list,
        crate::routes::api_keys::create,
        crate::routes::api_keys::revoke,
        crate::routes::audit::list,
        crate::routes::admin::businesses,
        crate::routes::admin::stats,
        crate::routes::admin::audit_logs,
        crate::routes::widget::services,
        crate::routes::widget::availability,
        crate::routes::widget::book,
        crate::routes::integrations::list_bookings,
        crate::routes::integrations::create_booking,
        crate::routes::integrations::get_booking,
        crate::routes::integrations::list_customers,
        crate::routes::integrations::create_customer,
        crate::routes::integrations::get_customer,
        crate::routes::integrations::list_services,
        crate::routes::integrations::get_service,
        crate::routes::integrations::list_invoices,
        crate::routes::integrations::get_invoice,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            CustomerRequest,
            BookingRequest,
            BookingUpdateRequest,
            ServiceRequest,
            QuoteRequest,
            InvoiceRequest,
            InvoiceUpdateRequest,
            RefundRequest,
            StatusRequest,
            CommunicationRequest,
            TrackingRequest,
            ApiKeyRequest,
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "bookings"),
        (name = "customers"),
        (name = "services"),
        (name = "invoices"),
        (name = "refunds"),
        (name = "communications"),
        (name = "tracking"),
        (name = "api-keys"),
        (name = "audit"),
        (name = "realtime"),
        (name = "admin", description = "Platform administration"),
        (name = "widget", description = "Public booking widget"),
        (name = "v1", description = "External integrations authenticated by x-api-key")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for p in ["/api/bookings", "/v1/bookings", "/widget/{slug}/bookings", "/api/services/{id}/availability"] {
            assert!(doc.paths.paths.contains_key(p), "missing {p}");
        }
        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("api_key"));
    }
}
