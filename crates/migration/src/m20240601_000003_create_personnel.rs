//! Create `personnel` table.
//!
//! `branch_id` is nullable: company-wide staff are not bound to a branch.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Personnel::Table)
                    .if_not_exists()
                    .col(pk_auto(Personnel::Id))
                    .col(integer(Personnel::CompanyId).not_null())
                    .col(integer_null(Personnel::BranchId))
                    .col(string_len(Personnel::Name, 128).not_null())
                    .col(string_len_null(Personnel::Phone, 20))
                    .col(string_len_null(Personnel::Email, 255))
                    .col(string_len(Personnel::Role, 32).not_null())
                    .col(string_len(Personnel::Username, 64).unique_key().not_null())
                    .col(string_len(Personnel::PasswordHash, 255).not_null())
                    .col(boolean(Personnel::IsActive).default(true).not_null())
                    .col(timestamp_with_time_zone(Personnel::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Personnel::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_personnel_company")
                            .from(Personnel::Table, Personnel::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_personnel_branch")
                            .from(Personnel::Table, Personnel::BranchId)
                            .to(Branch::Table, Branch::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Personnel::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Personnel {
    Table,
    Id,
    CompanyId,
    BranchId,
    Name,
    Phone,
    Email,
    Role,
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

#[derive(DeriveIden)]
enum Branch {
    #[sea_orm(iden = "branches")]
    Table,
    Id,
}
