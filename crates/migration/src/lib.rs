//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_company;
mod m20240601_000002_create_branch;
mod m20240601_000003_create_personnel;
mod m20240601_000004_create_admin;
mod m20240601_000005_create_lookups;
mod m20240601_000006_create_customer;
mod m20240601_000007_create_service;
mod m20240601_000008_create_system_setting;
mod m20240601_000009_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_company::Migration),
            Box::new(m20240601_000002_create_branch::Migration),
            Box::new(m20240601_000003_create_personnel::Migration),
            Box::new(m20240601_000004_create_admin::Migration),
            Box::new(m20240601_000005_create_lookups::Migration),
            Box::new(m20240601_000006_create_customer::Migration),
            Box::new(m20240601_000007_create_service::Migration),
            Box::new(m20240601_000008_create_system_setting::Migration),
            // Indexes should always be applied last
            Box::new(m20240601_000009_add_indexes::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{ConnectOptions, Database};

    #[tokio::test]
    async fn migrations_apply_and_revert_on_sqlite() {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await.expect("connect sqlite");

        Migrator::up(&db, None).await.expect("migrate up");
        let manager = SchemaManager::new(&db);
        for table in ["companies", "branches", "personnel", "admins", "customers", "services", "system_settings", "brands", "models", "devices", "complaints", "operations"] {
            assert!(manager.has_table(table).await.expect("has_table"), "missing table {table}");
        }

        Migrator::down(&db, None).await.expect("migrate down");
        assert!(!manager.has_table("services").await.expect("has_table"));
    }
}
