use std::fmt;
use std::str::FromStr;

use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors};
use crate::{branch, company, customer, personnel, validation};

/// Service ticket.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub company_id: i32,
    pub branch_id: Option<i32>,
    pub technician_id: Option<i32>,
    pub device_id: Option<i32>,
    pub complaint_id: Option<i32>,
    pub brand_id: Option<i32>,
    pub model_id: Option<i32>,
    pub operation_id: Option<i32>,
    pub description: Option<String>,
    pub status: String,
    pub price_cents: Option<i64>,
    pub scheduled_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Customer, Company, Branch, Technician }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Customer => Entity::belongs_to(customer::Entity).from(Column::CustomerId).to(customer::Column::Id).into(),
            Relation::Company => Entity::belongs_to(company::Entity).from(Column::CompanyId).to(company::Column::Id).into(),
            Relation::Branch => Entity::belongs_to(branch::Entity).from(Column::BranchId).to(branch::Column::Id).into(),
            Relation::Technician => Entity::belongs_to(personnel::Entity).from(Column::TechnicianId).to(personnel::Column::Id).into(),
        }
    }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Customer.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn current_status(&self) -> Option<ServiceStatus> {
        self.status.parse().ok()
    }
}

/// Ticket lifecycle. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 5] = [
        ServiceStatus::Pending,
        ServiceStatus::Assigned,
        ServiceStatus::InProgress,
        ServiceStatus::Completed,
        ServiceStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::Assigned => "assigned",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Completed => "completed",
            ServiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceStatus::Completed | ServiceStatus::Cancelled)
    }

    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| format!("unknown service status: {s}"))
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable ticket fields; lookups are referenced by id.
#[derive(Debug, Clone, Default)]
pub struct ServiceDetails {
    pub device_id: Option<i32>,
    pub complaint_id: Option<i32>,
    pub brand_id: Option<i32>,
    pub model_id: Option<i32>,
    pub operation_id: Option<i32>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub scheduled_at: Option<DateTimeWithTimeZone>,
}

impl ServiceDetails {
    pub fn validate(&mut self, errors: &mut FieldErrors) {
        self.description = validation::non_empty(self.description.take());
        validation::optional_text(errors, "description", self.description.as_deref(), 2000);
        if matches!(self.price_cents, Some(p) if p < 0) {
            errors.push("price", "must not be negative");
        }
        if self.model_id.is_some() && self.brand_id.is_none() {
            errors.push("brand_id", "required when a model is selected");
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub customer_id: i32,
    pub company_id: i32,
    pub branch_id: Option<i32>,
    pub technician_id: Option<i32>,
    pub details: ServiceDetails,
}

/// Insert a ticket: `assigned` when a technician is given, `pending` otherwise.
pub async fn create<C: ConnectionTrait>(db: &C, input: NewService) -> Result<Model, errors::ModelError> {
    let NewService { customer_id, company_id, branch_id, technician_id, mut details } = input;
    let mut errs = FieldErrors::new();
    details.validate(&mut errs);
    errs.into_result()?;

    let status = if technician_id.is_some() { ServiceStatus::Assigned } else { ServiceStatus::Pending };
    let now = Utc::now().into();
    let am = ActiveModel {
        customer_id: Set(customer_id),
        company_id: Set(company_id),
        branch_id: Set(branch_id),
        technician_id: Set(technician_id),
        device_id: Set(details.device_id),
        complaint_id: Set(details.complaint_id),
        brand_id: Set(details.brand_id),
        model_id: Set(details.model_id),
        operation_id: Set(details.operation_id),
        description: Set(details.description),
        status: Set(status.as_str().to_string()),
        price_cents: Set(details.price_cents),
        scheduled_at: Set(details.scheduled_at),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_parse_back() {
        for st in ServiceStatus::ALL {
            assert_eq!(st.as_str().parse::<ServiceStatus>(), Ok(st));
        }
        assert!("done".parse::<ServiceStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(ServiceStatus::Completed.is_terminal());
        assert!(ServiceStatus::Cancelled.is_terminal());
        assert!(ServiceStatus::InProgress.is_open());
    }

    #[test]
    fn details_reject_negative_price_and_orphan_model() {
        let mut d = ServiceDetails { price_cents: Some(-1), model_id: Some(3), ..Default::default() };
        let mut errs = FieldErrors::new();
        d.validate(&mut errs);
        assert!(errs.has_field("price"));
        assert!(errs.has_field("brand_id"));
    }
}
