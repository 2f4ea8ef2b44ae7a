//! Create `services` table (service tickets).
//!
//! `company_id`/`branch_id` are copied from the customer at creation so the
//! scope filter can run on this table alone.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Service::Table)
                    .if_not_exists()
                    .col(pk_auto(Service::Id))
                    .col(integer(Service::CustomerId).not_null())
                    .col(integer(Service::CompanyId).not_null())
                    .col(integer_null(Service::BranchId))
                    .col(integer_null(Service::TechnicianId))
                    .col(integer_null(Service::DeviceId))
                    .col(integer_null(Service::ComplaintId))
                    .col(integer_null(Service::BrandId))
                    .col(integer_null(Service::ModelId))
                    .col(integer_null(Service::OperationId))
                    .col(text_null(Service::Description))
                    .col(string_len(Service::Status, 32).not_null())
                    .col(big_integer_null(Service::PriceCents))
                    .col(timestamp_with_time_zone_null(Service::ScheduledAt))
                    .col(timestamp_with_time_zone_null(Service::CompletedAt))
                    .col(timestamp_with_time_zone(Service::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Service::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_customer")
                            .from(Service::Table, Service::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_company")
                            .from(Service::Table, Service::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_branch")
                            .from(Service::Table, Service::BranchId)
                            .to(Branch::Table, Branch::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_technician")
                            .from(Service::Table, Service::TechnicianId)
                            .to(Personnel::Table, Personnel::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(&mut lookup_fk("fk_service_device", Service::DeviceId, Lookup::Devices))
                    .foreign_key(&mut lookup_fk("fk_service_complaint", Service::ComplaintId, Lookup::Complaints))
                    .foreign_key(&mut lookup_fk("fk_service_brand", Service::BrandId, Lookup::Brands))
                    .foreign_key(&mut lookup_fk("fk_service_model", Service::ModelId, Lookup::Models))
                    .foreign_key(&mut lookup_fk("fk_service_operation", Service::OperationId, Lookup::Operations))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Service::Table).to_owned()).await
    }
}

fn lookup_fk(name: &str, column: Service, table: Lookup) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(Service::Table, column)
        .to(table, Lookup::Id)
        .on_delete(ForeignKeyAction::SetNull)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

#[derive(DeriveIden, Clone, Copy)]
enum Service {
    #[sea_orm(iden = "services")]
    Table,
    Id,
    CustomerId,
    CompanyId,
    BranchId,
    TechnicianId,
    DeviceId,
    ComplaintId,
    BrandId,
    ModelId,
    OperationId,
    Description,
    Status,
    PriceCents,
    ScheduledAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customer {
    #[sea_orm(iden = "customers")]
    Table,
    Id,
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

#[derive(DeriveIden)]
enum Personnel {
    Table,
    Id,
}

#[derive(DeriveIden, Clone, Copy)]
enum Lookup {
    Devices,
    Complaints,
    Brands,
    Models,
    Operations,
    Id,
}
