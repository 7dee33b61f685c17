//! Create `businesses` table.
//!
//! Root entity for multi-tenancy; every other table references it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(uuid(Businesses::Id).primary_key())
                    .col(string_len(Businesses::Name, 128))
                    .col(string_len(Businesses::Slug, 128).unique_key())
                    .col(string_len_null(Businesses::Email, 255))
                    .col(string_len_null(Businesses::Phone, 32))
                    .col(string_len(Businesses::Timezone, 64))
                    .col(timestamp_with_time_zone(Businesses::CreatedAt))
                    .col(timestamp_with_time_zone(Businesses::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Businesses::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Businesses { Table, Id, Name, Slug, Email, Phone, Timezone, CreatedAt, UpdatedAt }
