//! Service tickets: dispatch, status lifecycle and the printable receipt.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PrimaryKeyTrait, QueryFilter,
    QueryOrder, Set, Statement,
};
use serde::Serialize;
use tracing::{info, instrument};

use models::errors::FieldErrors;
use models::role::Role;
use models::service::{self as ticket, NewService, ServiceDetails, ServiceStatus};
use models::{brand, complaint, customer, device, device_model, operation, personnel, system_setting};

use crate::auth::AuthContext;
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::scope::{placeholder, Permission};

/// Free-text line printed under every receipt.
pub const RECEIPT_FOOTER_KEY: &str = "receipt.footer";

pub struct CreateTicketInput {
    pub customer_id: i32,
    pub technician_id: Option<i32>,
    pub details: ServiceDetails,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<ServiceStatus>,
    pub technician_id: Option<i32>,
    pub customer_id: Option<i32>,
}

/// Joined row behind the thermal-printer page.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct ReceiptView {
    pub service_id: i32,
    pub status: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub scheduled_at: Option<sea_orm::prelude::DateTimeWithTimeZone>,
    pub completed_at: Option<sea_orm::prelude::DateTimeWithTimeZone>,
    pub created_at: sea_orm::prelude::DateTimeWithTimeZone,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub customer_city: Option<String>,
    pub customer_district: Option<String>,
    pub company_name: String,
    pub company_phone: Option<String>,
    pub company_address: Option<String>,
    pub branch_name: Option<String>,
    pub branch_phone: Option<String>,
    pub technician_name: Option<String>,
    pub device_name: Option<String>,
    pub complaint_name: Option<String>,
    pub brand_name: Option<String>,
    pub model_name: Option<String>,
    pub operation_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptPage {
    pub receipt: ReceiptView,
    pub footer: Option<String>,
}

const RECEIPT_SQL: &str = "SELECT s.id AS service_id, s.status, s.description, s.price_cents, s.scheduled_at, \
s.completed_at, s.created_at, c.name AS customer_name, c.phone AS customer_phone, c.address AS customer_address, \
c.city AS customer_city, c.district AS customer_district, co.name AS company_name, co.phone AS company_phone, \
co.address AS company_address, b.name AS branch_name, b.phone AS branch_phone, p.name AS technician_name, \
d.name AS device_name, cp.name AS complaint_name, br.name AS brand_name, m.name AS model_name, \
o.name AS operation_name \
FROM services s \
JOIN customers c ON c.id = s.customer_id \
JOIN companies co ON co.id = s.company_id \
LEFT JOIN branches b ON b.id = s.branch_id \
LEFT JOIN personnel p ON p.id = s.technician_id \
LEFT JOIN devices d ON d.id = s.device_id \
LEFT JOIN complaints cp ON cp.id = s.complaint_id \
LEFT JOIN brands br ON br.id = s.brand_id \
LEFT JOIN models m ON m.id = s.model_id \
LEFT JOIN operations o ON o.id = s.operation_id \
WHERE s.id = ";

async fn exists<C, E>(db: &C, id: i32) -> Result<bool, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    Ok(E::find_by_id(id).one(db).await?.is_some())
}

/// Every referenced lookup must exist and the model must belong to the brand.
async fn check_lookups<C: ConnectionTrait>(db: &C, details: &ServiceDetails) -> Result<(), ServiceError> {
    let mut errs = FieldErrors::new();
    if let Some(id) = details.device_id {
        if !exists::<_, device::Entity>(db, id).await? { errs.push("device_id", "unknown device"); }
    }
    if let Some(id) = details.complaint_id {
        if !exists::<_, complaint::Entity>(db, id).await? { errs.push("complaint_id", "unknown complaint"); }
    }
    if let Some(id) = details.operation_id {
        if !exists::<_, operation::Entity>(db, id).await? { errs.push("operation_id", "unknown operation"); }
    }
    if let Some(id) = details.brand_id {
        if !exists::<_, brand::Entity>(db, id).await? { errs.push("brand_id", "unknown brand"); }
    }
    if let Some(id) = details.model_id {
        match device_model::Entity::find_by_id(id).one(db).await? {
            Some(m) if Some(m.brand_id) == details.brand_id => {}
            Some(_) => errs.push("model_id", "model does not belong to the selected brand"),
            None => errs.push("model_id", "unknown model"),
        }
    }
    if errs.is_empty() { Ok(()) } else { Err(errs.into()) }
}

/// The technician must be an active technician of the ticket's company and
/// branch. A branch-less ticket only takes branch-less technicians, otherwise
/// the assignee could not see it through their scope.
async fn check_technician<C: ConnectionTrait>(db: &C, company_id: i32, branch_id: Option<i32>, technician_id: i32) -> Result<(), ServiceError> {
    let tech = personnel::Entity::find_by_id(technician_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::invalid("technician_id", "unknown technician"))?;
    if tech.company_id != company_id || tech.branch_id != branch_id {
        return Err(ServiceError::invalid("technician_id", "technician must belong to the customer's company and branch"));
    }
    if tech.parsed_role() != Some(Role::Technician) || !tech.is_active {
        return Err(ServiceError::invalid("technician_id", "not an active technician"));
    }
    Ok(())
}

#[instrument(skip(db, ctx, input), fields(customer_id = input.customer_id))]
pub async fn create_ticket<C: ConnectionTrait>(db: &C, ctx: &AuthContext, input: CreateTicketInput) -> Result<ticket::Model, ServiceError> {
    ctx.scope.require(Permission::ManageServices)?;
    let CreateTicketInput { customer_id, technician_id, mut details } = input;

    let cust = customer::Entity::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::invalid("customer_id", "unknown customer"))?;
    ctx.scope.ensure_row(&cust)?;

    let mut errs = FieldErrors::new();
    details.validate(&mut errs);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    check_lookups(db, &details).await?;
    if let Some(tid) = technician_id {
        check_technician(db, cust.company_id, cust.branch_id, tid).await?;
    }

    let created = ticket::create(db, NewService {
        customer_id: cust.id,
        company_id: cust.company_id,
        branch_id: cust.branch_id,
        technician_id,
        details,
    })
    .await?;
    info!(event = "service_created", service_id = created.id, company_id = created.company_id, status = %created.status);
    Ok(created)
}

/// Visible tickets, newest first. Technicians only see their own assignments.
pub async fn list_tickets<C: ConnectionTrait>(db: &C, ctx: &AuthContext, filter: TicketFilter, pagination: Pagination) -> Result<Page<ticket::Model>, ServiceError> {
    let mut q = ctx.scope.apply(ticket::Entity::find()).order_by_desc(ticket::Column::CreatedAt).order_by_desc(ticket::Column::Id);
    if ctx.role() == Role::Technician {
        q = q.filter(ticket::Column::TechnicianId.eq(ctx.user_id));
    } else if let Some(tid) = filter.technician_id {
        q = q.filter(ticket::Column::TechnicianId.eq(tid));
    }
    if let Some(st) = filter.status {
        q = q.filter(ticket::Column::Status.eq(st.as_str()));
    }
    if let Some(cid) = filter.customer_id {
        q = q.filter(ticket::Column::CustomerId.eq(cid));
    }
    fetch_page(db, q, pagination).await
}

pub async fn get_ticket<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<ticket::Model, ServiceError> {
    let found = ticket::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    ctx.scope.ensure_row(&found)?;
    Ok(found)
}

fn current_status(t: &ticket::Model) -> Result<ServiceStatus, ServiceError> {
    t.current_status()
        .ok_or_else(|| ServiceError::Internal(format!("service {} has unknown status {}", t.id, t.status)))
}

/// Edit the ticket body (lookups, description, price, schedule).
pub async fn update_ticket<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, mut details: ServiceDetails) -> Result<ticket::Model, ServiceError> {
    ctx.scope.require(Permission::ManageServices)?;
    let existing = get_ticket(db, ctx, id).await?;
    let mut errs = FieldErrors::new();
    details.validate(&mut errs);
    if !errs.is_empty() {
        return Err(errs.into());
    }
    check_lookups(db, &details).await?;

    let mut am: ticket::ActiveModel = existing.into();
    am.device_id = Set(details.device_id);
    am.complaint_id = Set(details.complaint_id);
    am.brand_id = Set(details.brand_id);
    am.model_id = Set(details.model_id);
    am.operation_id = Set(details.operation_id);
    am.description = Set(details.description);
    am.price_cents = Set(details.price_cents);
    am.scheduled_at = Set(details.scheduled_at);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "service_updated", service_id = id);
    Ok(updated)
}

/// Assign (or with `None` unassign) a technician on an open ticket.
pub async fn assign_technician<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, technician_id: Option<i32>) -> Result<ticket::Model, ServiceError> {
    ctx.scope.require(Permission::ManageServices)?;
    let existing = get_ticket(db, ctx, id).await?;
    let status = current_status(&existing)?;
    if status.is_terminal() {
        return Err(ServiceError::invalid("status", "ticket is already closed"));
    }
    if let Some(tid) = technician_id {
        check_technician(db, existing.company_id, existing.branch_id, tid).await?;
    }
    let next = match (status, technician_id) {
        (ServiceStatus::Pending, Some(_)) => ServiceStatus::Assigned,
        (ServiceStatus::Assigned, None) => ServiceStatus::Pending,
        (s, _) => s,
    };
    let mut am: ticket::ActiveModel = existing.into();
    am.technician_id = Set(technician_id);
    am.status = Set(next.as_str().to_string());
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "service_assigned", service_id = id, technician_id = ?technician_id);
    Ok(updated)
}

/// Move a ticket through its lifecycle.
///
/// Closed tickets are frozen; completing stamps `completed_at`. Technicians may
/// only update tickets assigned to them.
pub async fn update_status<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32, next: ServiceStatus, price_cents: Option<i64>) -> Result<ticket::Model, ServiceError> {
    ctx.scope.require(Permission::UpdateServiceStatus)?;
    let existing = get_ticket(db, ctx, id).await?;
    if ctx.role() == Role::Technician && existing.technician_id != Some(ctx.user_id) {
        return Err(ServiceError::forbidden("ticket is not assigned to this technician"));
    }
    let status = current_status(&existing)?;
    if status.is_terminal() {
        return Err(ServiceError::invalid("status", "ticket is already closed"));
    }
    if matches!(next, ServiceStatus::Assigned | ServiceStatus::InProgress) && existing.technician_id.is_none() {
        return Err(ServiceError::invalid("status", "assign a technician first"));
    }
    if matches!(price_cents, Some(p) if p < 0) {
        return Err(ServiceError::invalid("price", "must not be negative"));
    }

    let mut am: ticket::ActiveModel = existing.into();
    am.status = Set(next.as_str().to_string());
    if next == ServiceStatus::Completed {
        am.completed_at = Set(Some(Utc::now().into()));
    }
    if let Some(p) = price_cents {
        am.price_cents = Set(Some(p));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "service_status", service_id = id, from = %status, to = %next);
    Ok(updated)
}

pub async fn delete_ticket<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<(), ServiceError> {
    ctx.scope.require(Permission::ManageServices)?;
    let existing = get_ticket(db, ctx, id).await?;
    ticket::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(event = "service_deleted", service_id = id, company_id = existing.company_id);
    Ok(())
}

/// Receipt data for one ticket, read through the scoped SQL filter.
pub async fn receipt<C: ConnectionTrait>(db: &C, ctx: &AuthContext, id: i32) -> Result<ReceiptPage, ServiceError> {
    let backend = db.get_database_backend();
    let base = format!("{RECEIPT_SQL}{}", placeholder(backend, 1));
    let (sql, params) = ctx.scope.filter_sql(backend, &base, vec![id.into()], "s");
    let row = ReceiptView::find_by_statement(Statement::from_sql_and_values(backend, sql, params))
        .one(db)
        .await?;
    let receipt = match row {
        Some(r) => r,
        // 区分不存在与越权
        None => {
            get_ticket(db, ctx, id).await?;
            return Err(ServiceError::not_found("service"));
        }
    };
    let footer = system_setting::find_by_key(db, RECEIPT_FOOTER_KEY).await?.map(|s| s.value);
    Ok(ReceiptPage { receipt, footer })
}
