//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_business;
mod m20240301_000002_create_user;
mod m20240301_000003_create_user_credentials;
mod m20240301_000004_create_customer;
mod m20240301_000005_create_service;
mod m20240301_000006_create_booking;
mod m20240301_000007_create_invoice;
mod m20240301_000008_create_refund;
mod m20240301_000009_create_communication;
mod m20240301_000010_create_service_tracking;
mod m20240301_000011_create_audit_log;
mod m20240301_000012_create_api_key;
mod m20240301_000020_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_business::Migration),
            Box::new(m20240301_000002_create_user::Migration),
            Box::new(m20240301_000003_create_user_credentials::Migration),
            Box::new(m20240301_000004_create_customer::Migration),
            Box::new(m20240301_000005_create_service::Migration),
            Box::new(m20240301_000006_create_booking::Migration),
            Box::new(m20240301_000007_create_invoice::Migration),
            Box::new(m20240301_000008_create_refund::Migration),
            Box::new(m20240301_000009_create_communication::Migration),
            Box::new(m20240301_000010_create_service_tracking::Migration),
            Box::new(m20240301_000011_create_audit_log::Migration),
            Box::new(m20240301_000012_create_api_key::Migration),
            // Indexes should always be applied last
            Box::new(m20240301_000020_add_indexes::Migration),
        ]
    }
}
