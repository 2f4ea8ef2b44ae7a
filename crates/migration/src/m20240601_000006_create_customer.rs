//! Create `customers` table.
//!
//! Phone numbers are stored normalised; uniqueness per company is enforced
//! by `uniq_customer_company_phone` in the index migration.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customer::Table)
                    .if_not_exists()
                    .col(pk_auto(Customer::Id))
                    .col(integer(Customer::CompanyId).not_null())
                    .col(integer_null(Customer::BranchId))
                    .col(string_len(Customer::Name, 128).not_null())
                    .col(string_len(Customer::Phone, 20).not_null())
                    .col(string_len_null(Customer::Email, 255))
                    .col(text_null(Customer::Address))
                    .col(string_len_null(Customer::City, 64))
                    .col(string_len_null(Customer::District, 64))
                    .col(timestamp_with_time_zone(Customer::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Customer::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_company")
                            .from(Customer::Table, Customer::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_branch")
                            .from(Customer::Table, Customer::BranchId)
                            .to(Branch::Table, Branch::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Customer::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Customer {
    #[sea_orm(iden = "customers")]
    Table,
    Id,
    CompanyId,
    BranchId,
    Name,
    Phone,
    Email,
    Address,
    City,
    District,
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
