//! System-wide key/value settings (super admin only).

use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder, TransactionTrait};
use tracing::info;

use models::errors::FieldErrors;
use models::system_setting;

use crate::auth::AuthContext;
use crate::errors::ServiceError;
use crate::scope::Permission;

pub async fn list_settings<C: ConnectionTrait>(db: &C, ctx: &AuthContext) -> Result<Vec<system_setting::Model>, ServiceError> {
    ctx.scope.require(Permission::ManageSystemSettings)?;
    Ok(system_setting::Entity::find().order_by_asc(system_setting::Column::Key).all(db).await?)
}

pub async fn get_setting<C: ConnectionTrait>(db: &C, ctx: &AuthContext, key: &str) -> Result<system_setting::Model, ServiceError> {
    ctx.scope.require(Permission::ManageSystemSettings)?;
    system_setting::find_by_key(db, key).await?.ok_or_else(|| ServiceError::not_found("setting"))
}

/// Write every pair in one transaction; all keys are validated first.
pub async fn save_settings<C>(db: &C, ctx: &AuthContext, pairs: Vec<(String, String)>) -> Result<usize, ServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    ctx.scope.require(Permission::ManageSystemSettings)?;
    let mut errs = FieldErrors::new();
    for (key, _) in &pairs {
        system_setting::validate_key(&mut errs, key);
    }
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let txn = db.begin().await?;
    for (key, value) in &pairs {
        system_setting::upsert(&txn, key, value.trim(), Some(ctx.display_name.as_str())).await?;
    }
    txn.commit().await?;
    info!(event = "settings_saved", count = pairs.len(), updated_by = %ctx.display_name);
    Ok(pairs.len())
}
