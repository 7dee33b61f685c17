use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceTracking::Table)
                    .if_not_exists()
                    .col(uuid(ServiceTracking::Id).primary_key())
                    .col(uuid(ServiceTracking::BusinessId))
                    .col(uuid(ServiceTracking::BookingId).unique_key())
                    .col(string_len(ServiceTracking::Status, 32))
                    .col(string_len_null(ServiceTracking::TechnicianName, 128))
                    .col(text_null(ServiceTracking::Notes))
                    .col(timestamp_with_time_zone_null(ServiceTracking::Eta))
                    .col(timestamp_with_time_zone(ServiceTracking::CreatedAt))
                    .col(timestamp_with_time_zone(ServiceTracking::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_tracking_business")
                            .from(ServiceTracking::Table, ServiceTracking::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_tracking_booking")
                            .from(ServiceTracking::Table, ServiceTracking::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceTracking::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceTracking {
    Table,
    Id,
    BusinessId,
    BookingId,
    Status,
    TechnicianName,
    Notes,
    Eta,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Businesses { Table, Id }

#[derive(DeriveIden)]
enum Bookings { Table, Id }
