//! Create `system_settings` key/value table with an audit pair
//! (`updated_by`, `updated_at`).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemSetting::Table)
                    .if_not_exists()
                    .col(pk_auto(SystemSetting::Id))
                    .col(string_len(SystemSetting::Key, 128).unique_key().not_null())
                    .col(text(SystemSetting::Value).not_null())
                    .col(string_len_null(SystemSetting::UpdatedBy, 64))
                    .col(timestamp_with_time_zone(SystemSetting::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SystemSetting::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SystemSetting {
    #[sea_orm(iden = "system_settings")]
    Table,
    Id,
    Key,
    Value,
    UpdatedBy,
    UpdatedAt,
}
