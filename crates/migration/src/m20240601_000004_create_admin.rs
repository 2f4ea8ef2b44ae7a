//! Create `admins` table: super-admin accounts, not bound to any company.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Admin::Table)
                    .if_not_exists()
                    .col(pk_auto(Admin::Id))
                    .col(string_len(Admin::Username, 64).unique_key().not_null())
                    .col(string_len(Admin::Name, 128).not_null())
                    .col(string_len(Admin::PasswordHash, 255).not_null())
                    .col(timestamp_with_time_zone(Admin::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Admin::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Admin {
    #[sea_orm(iden = "admins")]
    Table,
    Id,
    Username,
    Name,
    PasswordHash,
    CreatedAt,
}
