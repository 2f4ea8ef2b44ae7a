//! Subscription gate: a company whose `service_end_date` is before today is
//! locked out until the date is extended.

use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::Serialize;
use tracing::debug;

use models::{branch, company, personnel};

use crate::auth::domain::LoginKind;
use crate::auth::AuthContext;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateStatus {
    Open,
    Expired { end_date: NaiveDate },
}

/// The end date itself is still a valid day.
pub fn is_expired(end_date: NaiveDate, today: NaiveDate) -> bool {
    end_date < today
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Evaluate the gate for the caller's company. Super admins are never gated.
///
/// A deactivated or deleted company, branch or personnel account ends the
/// session with `Forbidden`, since tokens outlive those changes.
pub async fn check<C: ConnectionTrait>(db: &C, ctx: &AuthContext, today: NaiveDate) -> Result<GateStatus, ServiceError> {
    let Some(company_id) = ctx.company_id() else {
        return Ok(GateStatus::Open);
    };
    let company = company::Entity::find_by_id(company_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::forbidden("session company no longer exists"))?;
    if !company.is_active {
        return Err(ServiceError::forbidden("company deactivated"));
    }
    ensure_account_active(db, ctx).await?;
    if is_expired(company.service_end_date, today) {
        debug!(company_id, end_date = %company.service_end_date, "subscription expired");
        return Ok(GateStatus::Expired { end_date: company.service_end_date });
    }
    Ok(GateStatus::Open)
}

async fn ensure_account_active<C: ConnectionTrait>(db: &C, ctx: &AuthContext) -> Result<(), ServiceError> {
    let active = match ctx.user_type {
        LoginKind::Personnel => personnel::Entity::find_by_id(ctx.user_id).one(db).await?.map(|p| p.is_active),
        LoginKind::Branch => branch::Entity::find_by_id(ctx.user_id).one(db).await?.map(|b| b.is_active),
        LoginKind::Admin | LoginKind::Company => return Ok(()),
    };
    match active {
        Some(true) => Ok(()),
        Some(false) => Err(ServiceError::forbidden("account deactivated")),
        None => Err(ServiceError::forbidden("session account no longer exists")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use crate::test_support::{company_ctx, get_db, manager_ctx, seed, super_ctx, tech_ctx};
    use sea_orm::{ActiveModelTrait, Set};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

    #[test]
    fn end_date_is_inclusive() {
        assert!(!is_expired(d(2025, 6, 30), d(2025, 6, 30)));
        assert!(is_expired(d(2025, 6, 30), d(2025, 7, 1)));
        assert!(!is_expired(d(2025, 6, 30), d(2025, 1, 1)));
    }

    #[tokio::test]
    async fn expired_company_closes_gate_for_every_role() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let company = company::Entity::find_by_id(fx.company_a).one(&db).await?.unwrap();
        let mut am: company::ActiveModel = company.into();
        am.service_end_date = Set(d(2024, 12, 31));
        am.update(&db).await?;

        let today = d(2025, 1, 1);
        let expected = GateStatus::Expired { end_date: d(2024, 12, 31) };
        assert_eq!(check(&db, &company_ctx(fx.company_a), today).await?, expected);
        assert_eq!(check(&db, &tech_ctx(fx.tech_a1, fx.company_a, fx.branch_a1), today).await?, expected);
        assert_eq!(check(&db, &company_ctx(fx.company_b), today).await?, GateStatus::Open);
        assert_eq!(check(&db, &super_ctx(), today).await?, GateStatus::Open);
        assert_eq!(check(&db, &company_ctx(fx.company_a), d(2024, 12, 31)).await?, GateStatus::Open);
        Ok(())
    }

    #[tokio::test]
    async fn deactivated_accounts_lose_their_session() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let today = d(2025, 1, 1);
        let tech = tech_ctx(fx.tech_a1, fx.company_a, fx.branch_a1);
        let branch_login = AuthContext::new(fx.branch_a2, LoginKind::Branch, Scope::branch_manager(fx.company_a, Some(fx.branch_a2)), "alpha-2");
        assert_eq!(check(&db, &tech, today).await?, GateStatus::Open);
        assert_eq!(check(&db, &branch_login, today).await?, GateStatus::Open);

        let person = personnel::Entity::find_by_id(fx.tech_a1).one(&db).await?.unwrap();
        let mut am: personnel::ActiveModel = person.into();
        am.is_active = Set(false);
        am.update(&db).await?;
        let b = branch::Entity::find_by_id(fx.branch_a2).one(&db).await?.unwrap();
        let mut am: branch::ActiveModel = b.into();
        am.is_active = Set(false);
        am.update(&db).await?;

        assert!(matches!(check(&db, &tech, today).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(check(&db, &branch_login, today).await, Err(ServiceError::Forbidden(_))));
        // other accounts of the company are unaffected
        assert_eq!(check(&db, &manager_ctx(&fx), today).await?, GateStatus::Open);
        assert_eq!(check(&db, &company_ctx(fx.company_a), today).await?, GateStatus::Open);

        personnel::Entity::delete_by_id(fx.manager_a1).exec(&db).await?;
        assert!(matches!(check(&db, &manager_ctx(&fx), today).await, Err(ServiceError::Forbidden(_))));
        Ok(())
    }
}
