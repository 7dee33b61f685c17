//! Create `services` table (service templates).
//!
//! Weekly availability, scheduling rules and pricing rules are JSON documents.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(uuid(Services::Id).primary_key())
                    .col(uuid(Services::BusinessId))
                    .col(string_len(Services::Name, 128))
                    .col(text_null(Services::Description))
                    .col(string_len_null(Services::Category, 64))
                    .col(double(Services::BasePrice))
                    .col(integer(Services::DurationMinutes))
                    .col(json(Services::Availability))
                    .col(json(Services::SchedulingRules))
                    .col(json(Services::PricingRules))
                    .col(boolean(Services::Active))
                    .col(timestamp_with_time_zone(Services::CreatedAt))
                    .col(timestamp_with_time_zone(Services::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_services_business")
                            .from(Services::Table, Services::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
    BusinessId,
    Name,
    Description,
    Category,
    BasePrice,
    DurationMinutes,
    Availability,
    SchedulingRules,
    PricingRules,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Businesses { Table, Id }
