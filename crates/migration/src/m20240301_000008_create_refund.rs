use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Refunds::Table)
                    .if_not_exists()
                    .col(uuid(Refunds::Id).primary_key())
                    .col(uuid(Refunds::BusinessId))
                    .col(uuid(Refunds::InvoiceId))
                    .col(double(Refunds::Amount))
                    .col(text_null(Refunds::Reason))
                    .col(string_len(Refunds::Status, 32))
                    .col(timestamp_with_time_zone_null(Refunds::ProcessedAt))
                    .col(timestamp_with_time_zone(Refunds::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refunds_business")
                            .from(Refunds::Table, Refunds::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refunds_invoice")
                            .from(Refunds::Table, Refunds::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Refunds::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Refunds { Table, Id, BusinessId, InvoiceId, Amount, Reason, Status, ProcessedAt, CreatedAt }

#[derive(DeriveIden)]
enum Businesses { Table, Id }

#[derive(DeriveIden)]
enum Invoices { Table, Id }
