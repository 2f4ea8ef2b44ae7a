//! Shared catalogues: brands, models, devices, complaints and operations.
//!
//! Everyone signed in can read them; only super admins edit.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::info;

use models::{brand, complaint, device, device_model, operation};

use crate::auth::AuthContext;
use crate::errors::ServiceError;
use crate::scope::Permission;

/// Name-only catalogues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Brand,
    Device,
    Complaint,
    Operation,
}

impl LookupKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "brands" => Some(LookupKind::Brand),
            "devices" => Some(LookupKind::Device),
            "complaints" => Some(LookupKind::Complaint),
            "operations" => Some(LookupKind::Operation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LookupItem {
    pub id: i32,
    pub name: String,
}

/// Everything a ticket form needs in one round.
#[derive(Debug, Clone, Serialize)]
pub struct LookupCatalog {
    pub brands: Vec<LookupItem>,
    pub models: Vec<device_model::Model>,
    pub devices: Vec<LookupItem>,
    pub complaints: Vec<LookupItem>,
    pub operations: Vec<LookupItem>,
}

pub async fn list_lookup<C: ConnectionTrait>(db: &C, kind: LookupKind) -> Result<Vec<LookupItem>, ServiceError> {
    let items = match kind {
        LookupKind::Brand => brand::Entity::find().order_by_asc(brand::Column::Name).all(db).await?
            .into_iter().map(|m| LookupItem { id: m.id, name: m.name }).collect(),
        LookupKind::Device => device::Entity::find().order_by_asc(device::Column::Name).all(db).await?
            .into_iter().map(|m| LookupItem { id: m.id, name: m.name }).collect(),
        LookupKind::Complaint => complaint::Entity::find().order_by_asc(complaint::Column::Name).all(db).await?
            .into_iter().map(|m| LookupItem { id: m.id, name: m.name }).collect(),
        LookupKind::Operation => operation::Entity::find().order_by_asc(operation::Column::Name).all(db).await?
            .into_iter().map(|m| LookupItem { id: m.id, name: m.name }).collect(),
    };
    Ok(items)
}

pub async fn list_models<C: ConnectionTrait>(db: &C, brand_id: Option<i32>) -> Result<Vec<device_model::Model>, ServiceError> {
    let mut q = device_model::Entity::find().order_by_asc(device_model::Column::Name);
    if let Some(bid) = brand_id {
        q = q.filter(device_model::Column::BrandId.eq(bid));
    }
    Ok(q.all(db).await?)
}

pub async fn catalog<C: ConnectionTrait>(db: &C) -> Result<LookupCatalog, ServiceError> {
    Ok(LookupCatalog {
        brands: list_lookup(db, LookupKind::Brand).await?,
        models: list_models(db, None).await?,
        devices: list_lookup(db, LookupKind::Device).await?,
        complaints: list_lookup(db, LookupKind::Complaint).await?,
        operations: list_lookup(db, LookupKind::Operation).await?,
    })
}

pub async fn create_lookup<C: ConnectionTrait>(db: &C, ctx: &AuthContext, kind: LookupKind, name: &str) -> Result<LookupItem, ServiceError> {
    ctx.scope.require(Permission::ManageLookups)?;
    ensure_name_free(db, kind, name.trim()).await?;
    let item = match kind {
        LookupKind::Brand => brand::create(db, name).await.map(|m| LookupItem { id: m.id, name: m.name })?,
        LookupKind::Device => device::create(db, name).await.map(|m| LookupItem { id: m.id, name: m.name })?,
        LookupKind::Complaint => complaint::create(db, name).await.map(|m| LookupItem { id: m.id, name: m.name })?,
        LookupKind::Operation => operation::create(db, name).await.map(|m| LookupItem { id: m.id, name: m.name })?,
    };
    info!(event = "lookup_created", kind = ?kind, id = item.id);
    Ok(item)
}

async fn ensure_name_free<C: ConnectionTrait>(db: &C, kind: LookupKind, name: &str) -> Result<(), ServiceError> {
    let taken = list_lookup(db, kind).await?.iter().any(|i| i.name.eq_ignore_ascii_case(name));
    if taken {
        return Err(ServiceError::invalid("name", "already exists"));
    }
    Ok(())
}

pub async fn create_model<C: ConnectionTrait>(db: &C, ctx: &AuthContext, brand_id: i32, name: &str) -> Result<device_model::Model, ServiceError> {
    ctx.scope.require(Permission::ManageLookups)?;
    if brand::Entity::find_by_id(brand_id).one(db).await?.is_none() {
        return Err(ServiceError::invalid("brand_id", "unknown brand"));
    }
    let taken = list_models(db, Some(brand_id)).await?.iter().any(|m| m.name.eq_ignore_ascii_case(name.trim()));
    if taken {
        return Err(ServiceError::invalid("name", "already exists"));
    }
    let created = device_model::create(db, brand_id, name).await?;
    info!(event = "model_created", brand_id, id = created.id);
    Ok(created)
}

/// Delete a catalogue entry; tickets referencing it keep a null reference.
pub async fn delete_lookup<C: ConnectionTrait>(db: &C, ctx: &AuthContext, kind: LookupKind, id: i32) -> Result<(), ServiceError> {
    ctx.scope.require(Permission::ManageLookups)?;
    let res = match kind {
        LookupKind::Brand => brand::Entity::delete_by_id(id).exec(db).await?,
        LookupKind::Device => device::Entity::delete_by_id(id).exec(db).await?,
        LookupKind::Complaint => complaint::Entity::delete_by_id(id).exec(db).await?,
        LookupKind::Operation => operation::Entity::delete_by_id(id).exec(db).await?,
    };
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("lookup"));
    }
    info!(event = "lookup_deleted", kind = ?kind, id);
    Ok(())
}

pub async fn delete_model<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<(), ServiceError> {
    ctx.scope.require(Permission::ManageLookups)?;
    let res = device_model::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("model"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{company_ctx, get_db, super_ctx};

    #[tokio::test]
    async fn catalogue_crud() -> anyhow::Result<()> {
        let db = get_db().await?;
        let ctx = super_ctx();
        let daikin = create_lookup(&db, &ctx, LookupKind::Brand, "Daikin").await?;
        create_lookup(&db, &ctx, LookupKind::Device, "Split").await?;
        create_model(&db, &ctx, daikin.id, "FTXM35").await?;
        create_model(&db, &ctx, daikin.id, "FTXM50").await?;
        match create_model(&db, &ctx, daikin.id, "ftxm35 ").await {
            Err(ServiceError::Validation(f)) => assert!(f.has_field("name")),
            other => panic!("expected validation error, got {other:?}"),
        }

        let dup = create_lookup(&db, &ctx, LookupKind::Brand, "daikin").await;
        assert!(matches!(dup, Err(ServiceError::Validation(_))));

        let cat = catalog(&db).await?;
        assert_eq!(cat.brands, vec![LookupItem { id: daikin.id, name: "Daikin".into() }]);
        assert_eq!(list_models(&db, Some(daikin.id)).await?.len(), 2);

        // brand removal cascades to its models
        delete_lookup(&db, &ctx, LookupKind::Brand, daikin.id).await?;
        assert!(list_models(&db, None).await?.is_empty());
        assert!(matches!(delete_lookup(&db, &ctx, LookupKind::Brand, daikin.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn only_super_admin_edits() -> anyhow::Result<()> {
        let db = get_db().await?;
        let res = create_lookup(&db, &company_ctx(1), LookupKind::Complaint, "Gas leak").await;
        assert!(matches!(res, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[test]
    fn kind_from_path_segment() {
        assert_eq!(LookupKind::parse("devices"), Some(LookupKind::Device));
        assert_eq!(LookupKind::parse("models"), None);
    }
}
