//! Create `companies` table.
//!
//! Root entity for multi-tenancy; every tenant-scoped table references it.
//! `service_end_date` drives the subscription gate.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(pk_auto(Company::Id))
                    .col(string_len(Company::Name, 128).not_null())
                    .col(string_len_null(Company::ContactName, 128))
                    .col(string_len_null(Company::Phone, 20))
                    .col(string_len_null(Company::Email, 255))
                    .col(text_null(Company::Address))
                    .col(date(Company::ServiceEndDate).not_null())
                    .col(string_len(Company::Username, 64).unique_key().not_null())
                    .col(string_len(Company::PasswordHash, 255).not_null())
                    .col(boolean(Company::IsActive).default(true).not_null())
                    .col(timestamp_with_time_zone(Company::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Company::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Company::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Company {
    #[sea_orm(iden = "companies")]
    Table,
    Id,
    Name,
    ContactName,
    Phone,
    Email,
    Address,
    ServiceEndDate,
    Username,
    PasswordHash,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
