//! Branch managers and technicians.
//!
//! Company admins manage all staff of their company; branch managers only
//! technicians of their own branch.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use models::errors::FieldErrors;
use models::personnel::{self, NewPersonnel, PersonnelProfile};
use models::role::Role;
use models::{branch, validation};

use crate::auth::{hash_password, AuthContext};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::scope::Permission;

pub struct CreatePersonnelInput {
    pub company_id: Option<i32>,
    pub branch_id: Option<i32>,
    pub role: Role,
    pub profile: PersonnelProfile,
    pub username: String,
    pub password: String,
}

pub struct UpdatePersonnelInput {
    pub profile: PersonnelProfile,
    pub role: Role,
    pub branch_id: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PersonnelFilter {
    pub role: Option<Role>,
    pub branch_id: Option<i32>,
}

/// Branch managers may only touch technicians.
fn ensure_manageable_role(ctx: &AuthContext, role: Role) -> Result<(), ServiceError> {
    if ctx.role() == Role::BranchManager && role != Role::Technician {
        return Err(ServiceError::forbidden("branch managers manage technicians only"));
    }
    Ok(())
}

/// A branch referenced from a form must exist and belong to `company_id`.
pub(crate) async fn ensure_branch_in_company<C: ConnectionTrait>(db: &C, company_id: i32, branch_id: Option<i32>) -> Result<(), ServiceError> {
    let Some(bid) = branch_id else { return Ok(()) };
    match branch::Entity::find_by_id(bid).one(db).await? {
        Some(b) if b.company_id == company_id => Ok(()),
        _ => Err(ServiceError::invalid("branch_id", "branch does not belong to this company")),
    }
}

pub async fn create_personnel<C: ConnectionTrait>(db: &C, ctx: &AuthContext, input: CreatePersonnelInput) -> Result<personnel::Model, ServiceError> {
    ctx.scope.require(Permission::ManagePersonnel)?;
    ensure_manageable_role(ctx, input.role)?;
    let (company_id, branch_id) = ctx.scope.owner_for_new(input.company_id, input.branch_id)?;
    ensure_branch_in_company(db, company_id, branch_id).await?;

    let mut errs = FieldErrors::new();
    validation::validate_password(&mut errs, "password", &input.password);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let created = personnel::create(db, NewPersonnel {
        company_id,
        branch_id,
        role: input.role,
        profile: input.profile,
        username: input.username,
        password_hash: hash_password(&input.password)?,
    })
    .await?;
    info!(event = "personnel_created", personnel_id = created.id, company_id, branch_id = ?branch_id, role = %input.role);
    Ok(created)
}

pub async fn list_personnel<C: ConnectionTrait>(db: &C, ctx: &AuthContext, filter: PersonnelFilter, pagination: Pagination) -> Result<Page<personnel::Model>, ServiceError> {
    let mut q = ctx.scope.apply(personnel::Entity::find()).order_by_asc(personnel::Column::Name);
    if let Some(role) = filter.role {
        q = q.filter(personnel::Column::Role.eq(role.as_str()));
    }
    if let Some(bid) = filter.branch_id {
        q = q.filter(personnel::Column::BranchId.eq(bid));
    }
    fetch_page(db, q, pagination).await
}

/// Active technicians visible to the caller that can take a ticket of
/// `branch_id`; `None` means company-wide technicians only.
pub async fn technician_options<C: ConnectionTrait>(db: &C, ctx: &AuthContext, branch_id: Option<i32>) -> Result<Vec<personnel::Model>, ServiceError> {
    let branch = match branch_id {
        Some(bid) => personnel::Column::BranchId.eq(bid),
        None => personnel::Column::BranchId.is_null(),
    };
    let q = ctx
        .scope
        .apply(personnel::Entity::find())
        .filter(personnel::Column::Role.eq(Role::Technician.as_str()))
        .filter(personnel::Column::IsActive.eq(true))
        .filter(branch)
        .order_by_asc(personnel::Column::Name);
    Ok(q.all(db).await?)
}

pub async fn get_personnel<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<personnel::Model, ServiceError> {
    let found = personnel::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("personnel"))?;
    ctx.scope.ensure_row(&found)?;
    Ok(found)
}

/// Load a row the caller may modify: visible and of a role the caller manages.
async fn get_manageable<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<personnel::Model, ServiceError> {
    ctx.scope.require(Permission::ManagePersonnel)?;
    let existing = get_personnel(db, ctx, id).await?;
    let role = existing
        .parsed_role()
        .ok_or_else(|| ServiceError::Internal(format!("personnel {id} has unknown role")))?;
    ensure_manageable_role(ctx, role)?;
    Ok(existing)
}

pub async fn update_personnel<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, input: UpdatePersonnelInput) -> Result<personnel::Model, ServiceError> {
    let existing = get_manageable(db, ctx, id).await?;
    ensure_manageable_role(ctx, input.role)?;

    // 分店角色不能把人员调到其他分店
    let branch_id = if ctx.role() == Role::BranchManager { existing.branch_id } else { input.branch_id };
    ensure_branch_in_company(db, existing.company_id, branch_id).await?;

    let UpdatePersonnelInput { mut profile, role, is_active, .. } = input;
    let mut errs = FieldErrors::new();
    profile.validate(&mut errs);
    personnel::validate_role(&mut errs, role);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let mut am: personnel::ActiveModel = existing.into();
    am.name = Set(profile.name);
    am.phone = Set(profile.phone);
    am.email = Set(profile.email);
    am.role = Set(role.as_str().to_string());
    am.branch_id = Set(branch_id);
    am.is_active = Set(is_active);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "personnel_updated", personnel_id = id);
    Ok(updated)
}

pub async fn change_personnel_password<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, new_password: &str) -> Result<(), ServiceError> {
    let existing = get_manageable(db, ctx, id).await?;
    let mut errs = FieldErrors::new();
    validation::validate_password(&mut errs, "password", new_password);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let mut am: personnel::ActiveModel = existing.into();
    am.password_hash = Set(hash_password(new_password)?);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await?;
    Ok(())
}

/// Delete a staff member; their open tickets become unassigned.
pub async fn delete_personnel<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<(), ServiceError> {
    let existing = get_manageable(db, ctx, id).await?;
    personnel::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(event = "personnel_deleted", personnel_id = id, company_id = existing.company_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{company_ctx, get_db, manager_ctx, seed, tech_ctx};

    fn input(role: Role, branch_id: Option<i32>, username: &str) -> CreatePersonnelInput {
        CreatePersonnelInput {
            company_id: None,
            branch_id,
            role,
            profile: PersonnelProfile { name: "Yeni".into(), phone: Some("5551234567".into()), ..Default::default() },
            username: username.into(),
            password: "Passw0rd!".into(),
        }
    }

    #[tokio::test]
    async fn manager_creates_technicians_in_own_branch_only() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let ctx = manager_ctx(&fx);
        let tech = create_personnel(&db, &ctx, input(Role::Technician, None, "tech.new")).await?;
        assert_eq!(tech.branch_id, Some(fx.branch_a1));
        assert_eq!(tech.phone.as_deref(), Some("05551234567"));

        let mgr = create_personnel(&db, &ctx, input(Role::BranchManager, None, "mgr.new")).await;
        assert!(matches!(mgr, Err(ServiceError::Forbidden(_))));
        let elsewhere = create_personnel(&db, &ctx, input(Role::Technician, Some(fx.branch_a2), "tech.other")).await;
        assert!(matches!(elsewhere, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let dup = create_personnel(&db, &company_ctx(fx.company_a), input(Role::Technician, Some(fx.branch_a1), "tech.a1")).await;
        assert!(matches!(dup, Err(ServiceError::Validation(ref f)) if f.has_field("username")));
        Ok(())
    }

    #[tokio::test]
    async fn company_admin_cannot_use_foreign_branch() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let res = create_personnel(&db, &company_ctx(fx.company_a), input(Role::Technician, Some(fx.branch_b1), "tech.x")).await;
        assert!(matches!(res, Err(ServiceError::Validation(ref f)) if f.has_field("branch_id")));
        let ok = create_personnel(&db, &company_ctx(fx.company_a), input(Role::BranchManager, Some(fx.branch_a2), "mgr.a2")).await?;
        assert_eq!(ok.parsed_role(), Some(Role::BranchManager));
        Ok(())
    }

    #[tokio::test]
    async fn technicians_cannot_manage_staff() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let ctx = tech_ctx(fx.tech_a1, fx.company_a, fx.branch_a1);
        assert!(matches!(delete_personnel(&db, &ctx, fx.tech_a1).await, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn manager_update_keeps_branch() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let updated = update_personnel(&db, &manager_ctx(&fx), fx.tech_a1, UpdatePersonnelInput {
            profile: PersonnelProfile { name: "Ali Veli".into(), ..Default::default() },
            role: Role::Technician,
            branch_id: Some(fx.branch_a2),
            is_active: true,
        })
        .await?;
        assert_eq!(updated.branch_id, Some(fx.branch_a1));
        assert_eq!(updated.name, "Ali Veli");

        let own = update_personnel(&db, &manager_ctx(&fx), fx.manager_a1, UpdatePersonnelInput {
            profile: PersonnelProfile { name: "Self".into(), ..Default::default() },
            role: Role::BranchManager,
            branch_id: Some(fx.branch_a1),
            is_active: true,
        })
        .await;
        assert!(matches!(own, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn delete_unassigns_tickets() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        delete_personnel(&db, &company_ctx(fx.company_a), fx.tech_a2).await?;
        let ticket = models::service::Entity::find_by_id(fx.service_a2).one(&db).await?.unwrap();
        assert_eq!(ticket.technician_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn technician_options_are_scoped() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let opts = technician_options(&db, &company_ctx(fx.company_a), Some(fx.branch_a1)).await?;
        let ids: Vec<i32> = opts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![fx.tech_a1]);

        let elsewhere = technician_options(&db, &company_ctx(fx.company_a), Some(fx.branch_b1)).await?;
        assert!(elsewhere.is_empty());

        // a company-wide ticket only offers company-wide technicians
        assert!(technician_options(&db, &company_ctx(fx.company_a), None).await?.is_empty());
        let roaming = create_personnel(&db, &company_ctx(fx.company_a), input(Role::Technician, None, "tech.roaming")).await?;
        let opts = technician_options(&db, &company_ctx(fx.company_a), None).await?;
        assert_eq!(opts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![roaming.id]);
        Ok(())
    }
}
