use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users: one account per (business, email)
        manager
            .create_index(
                Index::create()
                    .name("uniq_users_business_email")
                    .table(Users::Table)
                    .col(Users::BusinessId)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Customers: composite unique (business_id, email)
        manager
            .create_index(
                Index::create()
                    .name("uniq_customers_business_email")
                    .table(Customers::Table)
                    .col(Customers::BusinessId)
                    .col(Customers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Bookings: lookups by (service, date) for slot conflicts
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_service_date")
                    .table(Bookings::Table)
                    .col(Bookings::ServiceId)
                    .col(Bookings::ScheduledDate)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_business")
                    .table(Bookings::Table)
                    .col(Bookings::BusinessId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_business")
                    .table(Invoices::Table)
                    .col(Invoices::BusinessId)
                    .to_owned(),
            )
            .await?;

        // AuditLogs: index on business and timestamp
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_business")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::BusinessId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_created_at")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_users_business_email").table(Users::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_customers_business_email").table(Customers::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bookings_service_date").table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bookings_business").table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_invoices_business").table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_audit_logs_business").table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_audit_logs_created_at").table(AuditLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users { Table, BusinessId, Email }

#[derive(DeriveIden)]
enum Customers { Table, BusinessId, Email }

#[derive(DeriveIden)]
enum Bookings { Table, BusinessId, ServiceId, ScheduledDate }

#[derive(DeriveIden)]
enum Invoices { Table, BusinessId }

#[derive(DeriveIden)]
enum AuditLogs { Table, BusinessId, CreatedAt }
