//! Landing-page aggregates: the technician's own work list and the scoped
//! summary shown to managers and admins.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, Statement,
};
use serde::Serialize;

use models::role::Role;
use models::service::{self as ticket, ServiceStatus};
use models::{branch, customer, personnel};

use crate::auth::AuthContext;
use crate::company_service;
use crate::errors::ServiceError;
use crate::scope::placeholder;
use crate::subscription;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: ServiceStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAssignment {
    pub service: ticket::Model,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicianDashboard {
    pub counts: Vec<StatusCount>,
    pub open: Vec<OpenAssignment>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Summary {
    /// Super admin only.
    pub companies: Option<u64>,
    pub expired_companies: Option<u64>,
    pub branches: u64,
    pub personnel: u64,
    pub customers: u64,
    pub open_services: u64,
    pub counts: Vec<StatusCount>,
}

#[derive(Debug, FromQueryResult)]
struct StatusRow {
    status: String,
    n: i64,
}

/// Per-status ticket counts inside the caller's scope; every status is listed.
pub async fn status_counts<C: ConnectionTrait>(db: &C, ctx: &AuthContext, technician_id: Option<i32>) -> Result<Vec<StatusCount>, ServiceError> {
    let backend = db.get_database_backend();
    let (base, params) = match technician_id {
        Some(tid) => (format!("SELECT s.status AS status, COUNT(*) AS n FROM services s WHERE s.technician_id = {}", placeholder(backend, 1)), vec![tid.into()]),
        None => ("SELECT s.status AS status, COUNT(*) AS n FROM services s WHERE 1=1".to_string(), vec![]),
    };
    let (sql, params) = ctx.scope.filter_sql(backend, &base, params, "s");
    let rows = StatusRow::find_by_statement(Statement::from_sql_and_values(backend, format!("{sql} GROUP BY s.status"), params))
        .all(db)
        .await?;
    Ok(ServiceStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: rows.iter().filter(|r| r.status == status.as_str()).map(|r| r.n).sum(),
        })
        .collect())
}

pub async fn technician_dashboard<C: ConnectionTrait>(db: &C, ctx: &AuthContext) -> Result<TechnicianDashboard, ServiceError> {
    let tech_id = match (ctx.role(), ctx.personnel_id()) {
        (Role::Technician, Some(id)) => id,
        _ => return Err(ServiceError::forbidden("technician dashboard requires a technician session")),
    };
    let counts = status_counts(db, ctx, Some(tech_id)).await?;
    let open_states: Vec<&str> = ServiceStatus::ALL.iter().filter(|s| s.is_open()).map(|s| s.as_str()).collect();
    let rows = ctx
        .scope
        .apply(ticket::Entity::find())
        .filter(ticket::Column::TechnicianId.eq(tech_id))
        .filter(ticket::Column::Status.is_in(open_states))
        .order_by_asc(ticket::Column::ScheduledAt)
        .order_by_asc(ticket::Column::Id)
        .find_also_related(customer::Entity)
        .all(db)
        .await?;
    let open = rows
        .into_iter()
        .map(|(service, cust)| OpenAssignment {
            service,
            customer_name: cust.as_ref().map(|c| c.name.clone()),
            customer_phone: cust.as_ref().map(|c| c.phone.clone()),
            customer_address: cust.and_then(|c| c.address),
        })
        .collect();
    Ok(TechnicianDashboard { counts, open })
}

pub async fn summary<C: ConnectionTrait>(db: &C, ctx: &AuthContext) -> Result<Summary, ServiceError> {
    let counts = status_counts(db, ctx, None).await?;
    let open_services = counts.iter().filter(|c| c.status.is_open()).map(|c| c.count as u64).sum();
    let (companies, expired_companies) = if ctx.scope.is_super_admin() {
        let total = models::company::Entity::find().count(db).await?;
        let expired = company_service::count_expired(db, subscription::today()).await?;
        (Some(total), Some(expired))
    } else {
        (None, None)
    };
    Ok(Summary {
        companies,
        expired_companies,
        branches: ctx.scope.apply(branch::Entity::find()).count(db).await?,
        personnel: ctx.scope.apply(personnel::Entity::find()).count(db).await?,
        customers: ctx.scope.apply(customer::Entity::find()).count(db).await?,
        open_services,
        counts,
    })
}
