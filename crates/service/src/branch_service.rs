use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use tracing::info;

use models::branch::{self, BranchProfile, NewBranch};
use models::errors::FieldErrors;
use models::{company, validation};

use crate::auth::{hash_password, AuthContext};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::scope::Permission;

pub struct CreateBranchInput {
    /// Only honoured for super admins; company admins always create in their own company.
    pub company_id: Option<i32>,
    pub profile: BranchProfile,
    pub username: String,
    pub password: String,
}

pub async fn create_branch<C: ConnectionTrait>(db: &C, ctx: &AuthContext, input: CreateBranchInput) -> Result<branch::Model, ServiceError> {
    ctx.scope.require(Permission::ManageBranches)?;
    let (company_id, _) = ctx.scope.owner_for_new(input.company_id, None)?;
    if company::Entity::find_by_id(company_id).one(db).await?.is_none() {
        return Err(ServiceError::invalid("company_id", "unknown company"));
    }
    let mut errs = FieldErrors::new();
    validation::validate_password(&mut errs, "password", &input.password);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let created = branch::create(db, NewBranch {
        company_id,
        profile: input.profile,
        username: input.username,
        password_hash: hash_password(&input.password)?,
    })
    .await?;
    info!(event = "branch_created", branch_id = created.id, company_id);
    Ok(created)
}

pub async fn list_branches<C: ConnectionTrait>(db: &C, ctx: &AuthContext, pagination: Pagination) -> Result<Page<branch::Model>, ServiceError> {
    let q = ctx
        .scope
        .apply(branch::Entity::find())
        .order_by_asc(branch::Column::CompanyId)
        .order_by_asc(branch::Column::Name);
    fetch_page(db, q, pagination).await
}

/// All visible branches, for select boxes.
pub async fn branch_options<C: ConnectionTrait>(db: &C, ctx: &AuthContext) -> Result<Vec<branch::Model>, ServiceError> {
    Ok(ctx.scope.apply(branch::Entity::find()).order_by_asc(branch::Column::Name).all(db).await?)
}

pub async fn get_branch<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<branch::Model, ServiceError> {
    let found = branch::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("branch"))?;
    ctx.scope.ensure_row(&found)?;
    Ok(found)
}

pub async fn update_branch<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, mut profile: BranchProfile, is_active: Option<bool>) -> Result<branch::Model, ServiceError> {
    ctx.scope.require(Permission::ManageBranches)?;
    let existing = get_branch(db, ctx, id).await?;
    let mut errs = FieldErrors::new();
    profile.validate(&mut errs);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let mut am: branch::ActiveModel = existing.into();
    am.name = Set(profile.name);
    am.phone = Set(profile.phone);
    am.email = Set(profile.email);
    am.address = Set(profile.address);
    if let Some(active) = is_active {
        am.is_active = Set(active);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "branch_updated", branch_id = id);
    Ok(updated)
}

pub async fn change_branch_password<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, new_password: &str) -> Result<(), ServiceError> {
    ctx.scope.require(Permission::ManageBranches)?;
    let existing = get_branch(db, ctx, id).await?;
    let mut errs = FieldErrors::new();
    validation::validate_password(&mut errs, "password", new_password);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let mut am: branch::ActiveModel = existing.into();
    am.password_hash = Set(hash_password(new_password)?);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await?;
    Ok(())
}

/// Delete a branch. Staff, customers and tickets keep their company and lose the branch.
pub async fn delete_branch<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<(), ServiceError> {
    ctx.scope.require(Permission::ManageBranches)?;
    let existing = get_branch(db, ctx, id).await?;
    branch::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(event = "branch_deleted", branch_id = id, company_id = existing.company_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{company_ctx, get_db, manager_ctx, seed, super_ctx};

    fn input(company_id: Option<i32>, username: &str) -> CreateBranchInput {
        CreateBranchInput {
            company_id,
            profile: BranchProfile { name: "Uskudar".into(), ..Default::default() },
            username: username.into(),
            password: "Passw0rd!".into(),
        }
    }

    #[tokio::test]
    async fn company_admin_creates_in_own_company() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let b = create_branch(&db, &company_ctx(fx.company_a), input(None, "alpha-3")).await?;
        assert_eq!(b.company_id, fx.company_a);
        let cross = create_branch(&db, &company_ctx(fx.company_a), input(Some(fx.company_b), "alpha-4")).await;
        assert!(matches!(cross, Err(ServiceError::Forbidden(_))));
        let missing = create_branch(&db, &super_ctx(), input(None, "nobody")).await;
        assert!(matches!(missing, Err(ServiceError::Validation(ref f)) if f.has_field("company_id")));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        // usernames are global, not per company
        let dup = create_branch(&db, &company_ctx(fx.company_b), input(None, "alpha-1")).await;
        assert!(matches!(dup, Err(ServiceError::Validation(ref f)) if f.has_field("username")));
        Ok(())
    }

    #[tokio::test]
    async fn branch_manager_cannot_manage_branches() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let own = get_branch(&db, &manager_ctx(&fx), fx.branch_a1).await?;
        assert_eq!(own.id, fx.branch_a1);
        let sibling = get_branch(&db, &manager_ctx(&fx), fx.branch_a2).await;
        assert!(matches!(sibling, Err(ServiceError::Forbidden(_))));
        let del = delete_branch(&db, &manager_ctx(&fx), fx.branch_a1).await;
        assert!(matches!(del, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn delete_keeps_tickets_company_bound() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        delete_branch(&db, &company_ctx(fx.company_a), fx.branch_a2).await?;
        let ticket = models::service::Entity::find_by_id(fx.service_a2).one(&db).await?.unwrap();
        assert_eq!(ticket.company_id, fx.company_a);
        assert_eq!(ticket.branch_id, None);
        let other = delete_branch(&db, &company_ctx(fx.company_a), fx.branch_b1).await;
        assert!(matches!(other, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_for_company_admin() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let page = list_branches(&db, &company_ctx(fx.company_a), Pagination::default()).await?;
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|b| b.company_id == fx.company_a));
        Ok(())
    }
}
