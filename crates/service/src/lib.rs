//! Service layer for the HVAC platform, on top of `models`.
//! - Scheduling and pricing engines are pure functions; the services modules wire them to storage.
//! - Every tenant-scoped operation takes a `TenantContext` so audit logs know the actor.
//! - Errors map onto `ServiceError`, which the HTTP layer turns into status codes.

pub mod errors;
pub mod auth;
pub mod context;
pub mod scheduling;
pub mod pricing;
pub mod rate_limiter;
pub mod realtime;
pub mod metrics;
pub mod notifications;
pub mod services;
#[cfg(test)]
pub mod test_support;
