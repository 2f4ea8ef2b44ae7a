//! Company administration and the company-settings page.

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, instrument};

use models::company::{self, CompanyProfile, NewCompany};
use models::errors::FieldErrors;
use models::{system_setting, validation};

use crate::auth::{hash_password, AuthContext};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::scope::Permission;

pub const FALLBACK_SERVICE_DAYS: i64 = 365;

pub struct CreateCompanyInput {
    pub profile: CompanyProfile,
    /// Defaults to today + `default_service_days`.
    pub service_end_date: Option<NaiveDate>,
    pub username: String,
    pub password: String,
}

/// End date for a new subscription starting `today`.
pub async fn default_end_date<C: ConnectionTrait>(db: &C, today: NaiveDate) -> Result<NaiveDate, ServiceError> {
    let days = system_setting::find_by_key(db, system_setting::DEFAULT_SERVICE_DAYS)
        .await?
        .and_then(|s| s.value.trim().parse::<i64>().ok())
        .filter(|d| *d > 0)
        .unwrap_or(FALLBACK_SERVICE_DAYS);
    Ok(today + Duration::days(days))
}

#[instrument(skip(db, ctx, input), fields(username = %input.username))]
pub async fn create_company<C: ConnectionTrait>(db: &C, ctx: &AuthContext, input: CreateCompanyInput) -> Result<company::Model, ServiceError> {
    ctx.scope.require(Permission::ManageCompanies)?;
    let mut errs = FieldErrors::new();
    validation::validate_password(&mut errs, "password", &input.password);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let service_end_date = match input.service_end_date {
        Some(d) => d,
        None => default_end_date(db, Utc::now().date_naive()).await?,
    };
    let created = company::create(db, NewCompany {
        profile: input.profile,
        service_end_date,
        username: input.username,
        password_hash: hash_password(&input.password)?,
    })
    .await?;
    info!(event = "company_created", company_id = created.id, end_date = %created.service_end_date);
    Ok(created)
}

/// Companies visible to the caller; super admins can search by name.
pub async fn list_companies<C: ConnectionTrait>(db: &C, ctx: &AuthContext, search: Option<&str>, pagination: Pagination) -> Result<Page<company::Model>, ServiceError> {
    let mut q = ctx.scope.apply(company::Entity::find()).order_by_asc(company::Column::Name);
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        q = q.filter(company::Column::Name.contains(term));
    }
    fetch_page(db, q, pagination).await
}

pub async fn get_company<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<company::Model, ServiceError> {
    let found = company::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("company"))?;
    ctx.scope.ensure_company(found.id)?;
    Ok(found)
}

/// Edit name and contact data. Company admins may only edit their own company.
pub async fn update_company_profile<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, mut profile: CompanyProfile) -> Result<company::Model, ServiceError> {
    ctx.scope.require(Permission::ManageCompanySettings)?;
    let existing = get_company(db, ctx, id).await?;
    let mut errs = FieldErrors::new();
    profile.validate(&mut errs);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let mut am: company::ActiveModel = existing.into();
    am.name = Set(profile.name);
    am.contact_name = Set(profile.contact_name);
    am.phone = Set(profile.phone);
    am.email = Set(profile.email);
    am.address = Set(profile.address);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "company_updated", company_id = id);
    Ok(updated)
}

/// Move the subscription end date; super admin only.
pub async fn extend_subscription<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, service_end_date: NaiveDate) -> Result<company::Model, ServiceError> {
    ctx.scope.require(Permission::ManageCompanies)?;
    let existing = get_company(db, ctx, id).await?;
    let previous = existing.service_end_date;
    let mut am: company::ActiveModel = existing.into();
    am.service_end_date = Set(service_end_date);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "subscription_extended", company_id = id, from = %previous, to = %service_end_date);
    Ok(updated)
}

pub async fn set_company_active<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, active: bool) -> Result<company::Model, ServiceError> {
    ctx.scope.require(Permission::ManageCompanies)?;
    let mut am: company::ActiveModel = get_company(db, ctx, id).await?.into();
    am.is_active = Set(active);
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

pub async fn change_company_password<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, new_password: &str) -> Result<(), ServiceError> {
    ctx.scope.require(Permission::ManageCompanySettings)?;
    let existing = get_company(db, ctx, id).await?;
    let mut errs = FieldErrors::new();
    validation::validate_password(&mut errs, "password", new_password);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    let mut am: company::ActiveModel = existing.into();
    am.password_hash = Set(hash_password(new_password)?);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await?;
    info!(event = "company_password_changed", company_id = id);
    Ok(())
}

/// Delete a company; its branches, staff, customers and tickets cascade.
pub async fn delete_company<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<(), ServiceError> {
    ctx.scope.require(Permission::ManageCompanies)?;
    let existing = get_company(db, ctx, id).await?;
    company::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(event = "company_deleted", company_id = id);
    Ok(())
}

/// Count of companies whose subscription has lapsed, for the admin dashboard.
pub async fn count_expired<C: ConnectionTrait>(db: &C, today: NaiveDate) -> Result<u64, ServiceError> {
    use sea_orm::PaginatorTrait;
    Ok(company::Entity::find()
        .filter(company::Column::ServiceEndDate.lt(today))
        .count(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{company_ctx, get_db, manager_ctx, seed, super_ctx};
    use sea_orm::PaginatorTrait;

    fn input(username: &str) -> CreateCompanyInput {
        CreateCompanyInput {
            profile: CompanyProfile { name: "Gamma Klima".into(), phone: Some("0212 555 00 11".into()), ..Default::default() },
            service_end_date: None,
            username: username.into(),
            password: "Passw0rd!".into(),
        }
    }

    #[tokio::test]
    async fn create_uses_default_service_days_setting() -> anyhow::Result<()> {
        let db = get_db().await?;
        let today = Utc::now().date_naive();

        let first = create_company(&db, &super_ctx(), input("gamma")).await?;
        assert_eq!(first.service_end_date, today + Duration::days(FALLBACK_SERVICE_DAYS));
        assert_eq!(first.phone.as_deref(), Some("02125550011"));

        system_setting::upsert(&db, system_setting::DEFAULT_SERVICE_DAYS, "30", Some("root")).await?;
        let second = create_company(&db, &super_ctx(), input("delta")).await?;
        assert_eq!(second.service_end_date, today + Duration::days(30));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() -> anyhow::Result<()> {
        let db = get_db().await?;
        seed(&db).await?;
        let dup = create_company(&db, &super_ctx(), input("alpha")).await;
        assert!(matches!(dup, Err(ServiceError::Validation(ref f)) if f.has_field("username")));
        assert_eq!(models::company::Entity::find().count(&db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn only_super_admin_creates_and_extends() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let denied = create_company(&db, &company_ctx(fx.company_a), input("gamma")).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));

        let new_end = NaiveDate::from_ymd_opt(2031, 1, 31).unwrap();
        let own = extend_subscription(&db, &company_ctx(fx.company_a), fx.company_a, new_end).await;
        assert!(matches!(own, Err(ServiceError::Forbidden(_))));
        let updated = extend_subscription(&db, &super_ctx(), fx.company_a, new_end).await?;
        assert_eq!(updated.service_end_date, new_end);
        Ok(())
    }

    #[tokio::test]
    async fn company_admin_edits_only_own_profile() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let ctx = company_ctx(fx.company_a);
        let profile = CompanyProfile { name: "Alpha Renamed".into(), ..Default::default() };
        let updated = update_company_profile(&db, &ctx, fx.company_a, profile.clone()).await?;
        assert_eq!(updated.name, "Alpha Renamed");

        let other = update_company_profile(&db, &ctx, fx.company_b, profile).await;
        assert!(matches!(other, Err(ServiceError::Forbidden(_))));
        let by_manager = update_company_profile(&db, &manager_ctx(&fx), fx.company_a, CompanyProfile { name: "x".into(), ..Default::default() }).await;
        assert!(matches!(by_manager, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_is_scoped() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let all = list_companies(&db, &super_ctx(), None, Pagination::default()).await?;
        assert_eq!(all.total, 2);
        let own = list_companies(&db, &company_ctx(fx.company_b), None, Pagination::default()).await?;
        assert_eq!(own.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![fx.company_b]);
        let searched = list_companies(&db, &super_ctx(), Some("Alp"), Pagination::default()).await?;
        assert_eq!(searched.total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn password_change_validates_length() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let short = change_company_password(&db, &company_ctx(fx.company_a), fx.company_a, "short").await;
        assert!(matches!(short, Err(ServiceError::Validation(ref f)) if f.has_field("password")));
        change_company_password(&db, &company_ctx(fx.company_a), fx.company_a, "N3wPassword").await?;
        Ok(())
    }
}
