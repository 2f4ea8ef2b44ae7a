//! Create `branches` table with FK to `companies`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Branch::Table)
                    .if_not_exists()
                    .col(pk_auto(Branch::Id))
                    .col(integer(Branch::CompanyId).not_null())
                    .col(string_len(Branch::Name, 128).not_null())
                    .col(string_len_null(Branch::Phone, 20))
                    .col(string_len_null(Branch::Email, 255))
                    .col(text_null(Branch::Address))
                    .col(string_len(Branch::Username, 64).unique_key().not_null())
                    .col(string_len(Branch::PasswordHash, 255).not_null())
                    .col(boolean(Branch::IsActive).default(true).not_null())
                    .col(timestamp_with_time_zone(Branch::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Branch::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_branch_company")
                            .from(Branch::Table, Branch::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Branch::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Branch {
    #[sea_orm(iden = "branches")]
    Table,
    Id,
    CompanyId,
    Name,
    Phone,
    Email,
    Address,
    Username,
    PasswordHash,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Company {
    #[sea_orm(iden = "companies")]
    Table,
    Id,
}
