use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Branches / personnel: tenant lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_branch_company")
                    .table(Branch::Table)
                    .col(Branch::CompanyId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_personnel_company_branch")
                    .table(Personnel::Table)
                    .col(Personnel::CompanyId)
                    .col(Personnel::BranchId)
                    .to_owned(),
            )
            .await?;

        // Customers: one phone per company
        manager
            .create_index(
                Index::create()
                    .name("uniq_customer_company_phone")
                    .table(Customer::Table)
                    .col(Customer::CompanyId)
                    .col(Customer::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Services: scope filter columns, technician dashboard
        manager
            .create_index(
                Index::create()
                    .name("idx_service_company_branch")
                    .table(Service::Table)
                    .col(Service::CompanyId)
                    .col(Service::BranchId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_service_technician_status")
                    .table(Service::Table)
                    .col(Service::TechnicianId)
                    .col(Service::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_branch_company").table(Branch::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_personnel_company_branch").table(Personnel::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_customer_company_phone").table(Customer::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_company_branch").table(Service::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_technician_status").table(Service::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Branch {
    #[sea_orm(iden = "branches")]
    Table,
    CompanyId,
}

#[derive(DeriveIden)]
enum Personnel { Table, CompanyId, BranchId }

#[derive(DeriveIden)]
enum Customer {
    #[sea_orm(iden = "customers")]
    Table,
    CompanyId,
    Phone,
}

#[derive(DeriveIden)]
enum Service {
    #[sea_orm(iden = "services")]
    Table,
    CompanyId,
    BranchId,
    TechnicianId,
    Status,
}
