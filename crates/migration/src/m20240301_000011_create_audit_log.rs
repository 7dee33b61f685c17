//! Create `audit_logs` table.
//!
//! `business_id` is nullable so platform-level actions can be recorded; no FK so
//! audit rows survive the deletion of the entity they describe.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(uuid(AuditLogs::Id).primary_key())
                    .col(uuid_null(AuditLogs::BusinessId))
                    .col(string_len(AuditLogs::Actor, 255))
                    .col(string_len(AuditLogs::Action, 32))
                    .col(string_len(AuditLogs::EntityType, 64))
                    .col(uuid_null(AuditLogs::EntityId))
                    .col(json(AuditLogs::Details))
                    .col(string_len_null(AuditLogs::IpAddress, 64))
                    .col(timestamp_with_time_zone(AuditLogs::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLogs::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuditLogs { Table, Id, BusinessId, Actor, Action, EntityType, EntityId, Details, IpAddress, CreatedAt }
