//! Service tickets: list, dispatch, status changes and the receipt page.

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::{Extension, Form, Json};
use serde::{Deserialize, Serialize};

use models::service::{self as ticket, ServiceDetails, ServiceStatus};
use service::auth::AuthContext;
use service::lookup_service::{self, LookupCatalog};
use service::pagination::Page;
use service::scope::Permission;
use service::ticket_service::{self, CreateTicketInput, ReceiptPage, TicketFilter};
use service::{personnel_service, ServiceError};

use crate::auth::ServerState;
use crate::errors::PageError;
use crate::forms::{self, done, empty_string_as_none, text, FlashQuery, ListQuery};

#[derive(Debug, Deserialize)]
pub struct TicketForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub customer_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub technician_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub device_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub complaint_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub brand_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub model_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub operation_id: Option<i32>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub scheduled_at: Option<String>,
}

impl TicketForm {
    fn details(&self) -> Result<ServiceDetails, ServiceError> {
        Ok(ServiceDetails {
            device_id: self.device_id,
            complaint_id: self.complaint_id,
            brand_id: self.brand_id,
            model_id: self.model_id,
            operation_id: self.operation_id,
            description: text(self.description.clone()),
            price_cents: forms::parse_price(self.price.as_deref())?,
            scheduled_at: forms::parse_datetime("scheduled_at", self.scheduled_at.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<ServiceStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub technician_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub customer_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub technician_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    pub price: Option<String>,
}

#[derive(Serialize)]
pub struct TicketList {
    #[serde(flatten)]
    pub page: Page<ticket::Model>,
    pub statuses: Vec<&'static str>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[derive(Serialize)]
pub struct TicketDetail {
    pub service: ticket::Model,
    pub lookups: LookupCatalog,
    /// Technicians the ticket can be dispatched to.
    pub technicians: Vec<models::personnel::Model>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[utoipa::path(get, path = "/services", tag = "services", params(("status" = Option<String>, Query, description = "pending, assigned, in_progress, completed or cancelled"), ("technician_id" = Option<i32>, Query, description = "Assigned technician")), responses((status = 200, description = "Service list")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(q): Query<ListQuery>,
    Query(filter): Query<TicketQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<TicketList>, PageError> {
    let filter = TicketFilter { status: filter.status, technician_id: filter.technician_id, customer_id: filter.customer_id };
    let page = ticket_service::list_tickets(&state.db, &ctx, filter, q.pagination()).await?;
    let statuses = ServiceStatus::ALL.iter().map(|s| s.as_str()).collect();
    Ok(Json(TicketList { page, statuses, flash }))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<TicketForm>,
) -> Result<Redirect, PageError> {
    let customer_id = form.customer_id.ok_or_else(|| ServiceError::invalid("customer_id", "required"))?;
    let input = CreateTicketInput { customer_id, technician_id: form.technician_id, details: form.details()? };
    let created = ticket_service::create_ticket(&state.db, &ctx, input).await?;
    Ok(done(&format!("/services/{}", created.id), "created"))
}

pub async fn show(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<TicketDetail>, PageError> {
    let service = ticket_service::get_ticket(&state.db, &ctx, id).await?;
    let lookups = lookup_service::catalog(&state.db).await?;
    let technicians = if ctx.scope.allows(Permission::ManageServices) {
        personnel_service::technician_options(&state.db, &ctx, service.branch_id).await?
    } else {
        Vec::new()
    };
    Ok(Json(TicketDetail { service, lookups, technicians, flash }))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<TicketForm>,
) -> Result<Redirect, PageError> {
    ticket_service::update_ticket(&state.db, &ctx, id, form.details()?).await?;
    Ok(done(&format!("/services/{id}"), "updated"))
}

pub async fn assign(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<AssignForm>,
) -> Result<Redirect, PageError> {
    ticket_service::assign_technician(&state.db, &ctx, id, form.technician_id).await?;
    Ok(done(&format!("/services/{id}"), "assigned"))
}

#[utoipa::path(post, path = "/services/{id}/status", tag = "services", params(("id" = i32, Path, description = "Service id")), request_body(content = crate::openapi::StatusRequest, content_type = "application/x-www-form-urlencoded"), responses((status = 303, description = "Status changed"), (status = 422, description = "Transition rejected")))]
pub async fn set_status(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, PageError> {
    let next = form.status.parse::<ServiceStatus>().map_err(|e| ServiceError::invalid("status", e))?;
    let price = forms::parse_price(form.price.as_deref())?;
    ticket_service::update_status(&state.db, &ctx, id, next, price).await?;
    Ok(done(&format!("/services/{id}"), "status_updated"))
}

#[utoipa::path(post, path = "/services/{id}/delete", tag = "services", params(("id" = i32, Path, description = "Service id")), responses((status = 303, description = "Deleted, or redirected with ?error=unauthorized")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<Redirect, PageError> {
    ticket_service::delete_ticket(&state.db, &ctx, id).await?;
    Ok(done("/services", "deleted"))
}

/// Data for the printer-friendly receipt.
#[utoipa::path(get, path = "/services/{id}/receipt", tag = "services", params(("id" = i32, Path, description = "Service id")), responses((status = 200, description = "Receipt data"), (status = 404, description = "No such service")))]
pub async fn receipt(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<Json<ReceiptPage>, PageError> {
    Ok(Json(ticket_service::receipt(&state.db, &ctx, id).await?))
}
