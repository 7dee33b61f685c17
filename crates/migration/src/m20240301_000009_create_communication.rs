use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Communications::Table)
                    .if_not_exists()
                    .col(uuid(Communications::Id).primary_key())
                    .col(uuid(Communications::BusinessId))
                    .col(uuid(Communications::CustomerId))
                    .col(uuid_null(Communications::BookingId))
                    .col(string_len(Communications::Channel, 16))
                    .col(string_len(Communications::Direction, 16))
                    .col(string_len_null(Communications::Subject, 255))
                    .col(text(Communications::Body))
                    .col(string_len(Communications::Status, 16))
                    .col(text_null(Communications::ErrorMessage))
                    .col(timestamp_with_time_zone_null(Communications::SentAt))
                    .col(timestamp_with_time_zone(Communications::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_communications_business")
                            .from(Communications::Table, Communications::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_communications_customer")
                            .from(Communications::Table, Communications::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Communications::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Communications {
    Table,
    Id,
    BusinessId,
    CustomerId,
    BookingId,
    Channel,
    Direction,
    Subject,
    Body,
    Status,
    ErrorMessage,
    SentAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Businesses { Table, Id }

#[derive(DeriveIden)]
enum Customers { Table, Id }
