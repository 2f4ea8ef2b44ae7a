use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use models::customer::{self, CustomerProfile, NewCustomer};
use models::errors::FieldErrors;

use crate::auth::AuthContext;
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::personnel_service::ensure_branch_in_company;
use crate::scope::Permission;

const DUPLICATE_PHONE: &str = "phone number already registered for another customer";

pub struct CreateCustomerInput {
    pub company_id: Option<i32>,
    pub branch_id: Option<i32>,
    pub profile: CustomerProfile,
}

pub async fn create_customer<C: ConnectionTrait>(db: &C, ctx: &AuthContext, input: CreateCustomerInput) -> Result<customer::Model, ServiceError> {
    ctx.scope.require(Permission::ManageCustomers)?;
    let (company_id, branch_id) = ctx.scope.owner_for_new(input.company_id, input.branch_id)?;
    ensure_branch_in_company(db, company_id, branch_id).await?;
    let created = customer::create(db, NewCustomer { company_id, branch_id, profile: input.profile }).await?;
    info!(event = "customer_created", customer_id = created.id, company_id);
    Ok(created)
}

/// Visible customers, optionally filtered by name or phone fragment.
pub async fn list_customers<C: ConnectionTrait>(db: &C, ctx: &AuthContext, search: Option<&str>, pagination: Pagination) -> Result<Page<customer::Model>, ServiceError> {
    let mut q = ctx.scope.apply(customer::Entity::find()).order_by_asc(customer::Column::Name);
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let mut cond = Condition::any().add(customer::Column::Name.contains(term));
        let digits: String = term.chars().filter(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            cond = cond.add(customer::Column::Phone.contains(digits.as_str()));
        }
        q = q.filter(cond);
    }
    fetch_page(db, q, pagination).await
}

pub async fn get_customer<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<customer::Model, ServiceError> {
    let found = customer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("customer"))?;
    ctx.scope.ensure_row(&found)?;
    Ok(found)
}

/// Update contact data. The branch can only be moved by company-level roles.
pub async fn update_customer<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, mut profile: CustomerProfile, branch_id: Option<i32>) -> Result<customer::Model, ServiceError> {
    ctx.scope.require(Permission::ManageCustomers)?;
    let existing = get_customer(db, ctx, id).await?;
    let mut errs = FieldErrors::new();
    profile.validate(&mut errs);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    if customer::phone_taken(db, existing.company_id, &profile.phone, Some(existing.id)).await? {
        return Err(ServiceError::invalid("phone", DUPLICATE_PHONE));
    }
    let branch_id = if ctx.role().is_personnel_role() { existing.branch_id } else { branch_id };
    ensure_branch_in_company(db, existing.company_id, branch_id).await?;

    let mut am: customer::ActiveModel = existing.into();
    am.name = Set(profile.name);
    am.phone = Set(profile.phone);
    am.email = Set(profile.email);
    am.address = Set(profile.address);
    am.city = Set(profile.city);
    am.district = Set(profile.district);
    am.branch_id = Set(branch_id);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "customer_updated", customer_id = id);
    Ok(updated)
}

/// Delete a customer together with their service history.
pub async fn delete_customer<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<(), ServiceError> {
    ctx.scope.require(Permission::ManageCustomers)?;
    let existing = get_customer(db, ctx, id).await?;
    customer::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(event = "customer_deleted", customer_id = id, company_id = existing.company_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{company_ctx, get_db, manager_ctx, seed, super_ctx};
    use sea_orm::PaginatorTrait;

    fn profile(name: &str, phone: &str) -> CustomerProfile {
        CustomerProfile { name: name.into(), phone: phone.into(), city: Some("Istanbul".into()), ..Default::default() }
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected_without_insert() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let before = customer::Entity::find().count(&db).await?;

        // 0532 100 00 01 is already used in company A (branch a1)
        let res = create_customer(&db, &company_ctx(fx.company_a), CreateCustomerInput {
            company_id: None,
            branch_id: Some(fx.branch_a2),
            profile: profile("Another", "+90 532 100 0001"),
        })
        .await;
        assert!(matches!(res, Err(ServiceError::Validation(ref f)) if f.has_field("phone")));
        assert_eq!(customer::Entity::find().count(&db).await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn update_to_existing_phone_is_rejected() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let res = update_customer(&db, &company_ctx(fx.company_a), fx.customer_a2, profile("Burak", "05321000001"), None).await;
        assert!(matches!(res, Err(ServiceError::Validation(ref f)) if f.has_field("phone")));
        // keeping its own number is fine
        let ok = update_customer(&db, &company_ctx(fx.company_a), fx.customer_a2, profile("Burak K", "0532 100 00 02"), Some(fx.branch_a2)).await?;
        assert_eq!(ok.name, "Burak K");
        Ok(())
    }

    #[tokio::test]
    async fn manager_writes_into_own_branch() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let c = create_customer(&db, &manager_ctx(&fx), CreateCustomerInput { company_id: None, branch_id: None, profile: profile("Emre", "05559998877") }).await?;
        assert_eq!((c.company_id, c.branch_id), (fx.company_a, Some(fx.branch_a1)));

        let moved = update_customer(&db, &manager_ctx(&fx), c.id, profile("Emre", "05559998877"), Some(fx.branch_a2)).await?;
        assert_eq!(moved.branch_id, Some(fx.branch_a1));

        let foreign = get_customer(&db, &manager_ctx(&fx), fx.customer_a2).await;
        assert!(matches!(foreign, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn search_matches_name_or_phone_digits() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        let ctx = company_ctx(fx.company_a);
        let by_name = list_customers(&db, &ctx, Some("Ays"), Pagination::default()).await?;
        assert_eq!(by_name.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![fx.customer_a1]);
        let by_phone = list_customers(&db, &ctx, Some("100 00 03"), Pagination::default()).await?;
        assert_eq!(by_phone.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![fx.customer_a]);
        let everyone = list_customers(&db, &super_ctx(), None, Pagination::default()).await?;
        assert_eq!(everyone.total, 4);
        Ok(())
    }

    #[tokio::test]
    async fn delete_cascades_to_services() -> anyhow::Result<()> {
        let db = get_db().await?;
        let fx = seed(&db).await?;
        delete_customer(&db, &company_ctx(fx.company_a), fx.customer_a1).await?;
        assert!(models::service::Entity::find_by_id(fx.service_a1).one(&db).await?.is_none());
        let denied = delete_customer(&db, &company_ctx(fx.company_b), fx.customer_a2).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
        Ok(())
    }
}
