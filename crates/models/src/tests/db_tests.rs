use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use anyhow::Result;

use super::setup_test_db;

#[tokio::test]
async fn test_memory_database_is_sqlite() -> Result<()> {
    let db = setup_test_db().await?;
    assert_eq!(db.get_database_backend(), DatabaseBackend::Sqlite);
    let row = db
        .query_one(Statement::from_string(DatabaseBackend::Sqlite, "SELECT 1 AS one".to_owned()))
        .await?;
    assert!(row.is_some());
    Ok(())
}

#[tokio::test]
async fn test_every_table_exists() -> Result<()> {
    let db = setup_test_db().await?;
    for table in [
        "companies", "branches", "personnel", "admins", "customers", "services",
        "system_settings", "brands", "models", "devices", "complaints", "operations",
    ] {
        let sql = format!("SELECT COUNT(*) AS n FROM {table}");
        let row = db.query_one(Statement::from_string(DatabaseBackend::Sqlite, sql)).await?;
        assert!(row.is_some(), "missing table {table}");
    }
    Ok(())
}
