//! Create the shared lookup tables: `brands`, `models`, `devices`,
//! `complaints` and `operations`.
//!
//! Brands and models are referenced from services by id only.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Brand::Table)
                    .if_not_exists()
                    .col(pk_auto(Brand::Id))
                    .col(string_len(Brand::Name, 128).unique_key().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DeviceModel::Table)
                    .if_not_exists()
                    .col(pk_auto(DeviceModel::Id))
                    .col(integer(DeviceModel::BrandId).not_null())
                    .col(string_len(DeviceModel::Name, 128).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_model_brand")
                            .from(DeviceModel::Table, DeviceModel::BrandId)
                            .to(Brand::Table, Brand::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for table in [Lookup::Devices, Lookup::Complaints, Lookup::Operations] {
            manager
                .create_table(
                    Table::create()
                        .table(table)
                        .if_not_exists()
                        .col(pk_auto(Lookup::Id))
                        .col(string_len(Lookup::Name, 128).unique_key().not_null())
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [Lookup::Operations, Lookup::Complaints, Lookup::Devices] {
            manager.drop_table(Table::drop().table(table).to_owned()).await?;
        }
        manager.drop_table(Table::drop().table(DeviceModel::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Brand::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Brand {
    #[sea_orm(iden = "brands")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum DeviceModel {
    #[sea_orm(iden = "models")]
    Table,
    Id,
    BrandId,
    Name,
}

/// Name-only lookup tables share one column layout.
#[derive(DeriveIden, Clone, Copy)]
enum Lookup {
    Devices,
    Complaints,
    Operations,
    Id,
    Name,
}
