use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::{Extension, Form, Json};
use serde::{Deserialize, Serialize};

use models::customer::{self, CustomerProfile};
use service::auth::AuthContext;
use service::customer_service::{self, CreateCustomerInput};
use service::pagination::{Page, Pagination};
use service::ticket_service::{self, TicketFilter};

use crate::auth::ServerState;
use crate::errors::PageError;
use crate::forms::{done, empty_string_as_none, text, FlashQuery, ListQuery};

#[derive(Debug, Deserialize)]
pub struct CustomerForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub company_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub branch_id: Option<i32>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
}

impl CustomerForm {
    fn profile(&self) -> CustomerProfile {
        CustomerProfile {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: text(self.email.clone()),
            address: text(self.address.clone()),
            city: text(self.city.clone()),
            district: text(self.district.clone()),
        }
    }
}

#[derive(Serialize)]
pub struct CustomerList {
    #[serde(flatten)]
    pub page: Page<customer::Model>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[derive(Serialize)]
pub struct CustomerDetail {
    pub customer: customer::Model,
    /// Most recent tickets of this customer visible to the caller.
    pub services: Vec<models::service::Model>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[utoipa::path(get, path = "/customers", tag = "customers", params(("q" = Option<String>, Query, description = "Name or phone fragment")), responses((status = 200, description = "Customers page")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(q): Query<ListQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<CustomerList>, PageError> {
    let page = customer_service::list_customers(&state.db, &ctx, q.search(), q.pagination()).await?;
    Ok(Json(CustomerList { page, flash }))
}

#[utoipa::path(post, path = "/customers", tag = "customers", request_body(content = crate::openapi::CustomerRequest, content_type = "application/x-www-form-urlencoded"), responses((status = 303, description = "Created"), (status = 422, description = "Validation errors, e.g. duplicate phone")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<CustomerForm>,
) -> Result<Redirect, PageError> {
    let input = CreateCustomerInput { company_id: form.company_id, branch_id: form.branch_id, profile: form.profile() };
    let created = customer_service::create_customer(&state.db, &ctx, input).await?;
    Ok(done(&format!("/customers/{}", created.id), "created"))
}

pub async fn show(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<CustomerDetail>, PageError> {
    let customer = customer_service::get_customer(&state.db, &ctx, id).await?;
    let filter = TicketFilter { customer_id: Some(customer.id), ..Default::default() };
    let services = ticket_service::list_tickets(&state.db, &ctx, filter, Pagination::default()).await?.items;
    Ok(Json(CustomerDetail { customer, services, flash }))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<CustomerForm>,
) -> Result<Redirect, PageError> {
    customer_service::update_customer(&state.db, &ctx, id, form.profile(), form.branch_id).await?;
    Ok(done(&format!("/customers/{id}"), "updated"))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<Redirect, PageError> {
    customer_service::delete_customer(&state.db, &ctx, id).await?;
    Ok(done("/customers", "deleted"))
}
