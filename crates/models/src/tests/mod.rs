/// Connection and schema tests
pub mod db_tests;


use sea_orm::DatabaseConnection;
use migration::MigratorTrait;

/// Fresh in-memory database with the full schema.
pub async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    let db = crate::db::connect_sqlite_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}
