use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::{Extension, Form, Json};
use serde::{Deserialize, Serialize};

use models::company::{self, CompanyProfile};
use service::auth::AuthContext;
use service::company_service::{self, CreateCompanyInput};
use service::pagination::Page;
use service::ServiceError;

use crate::auth::ServerState;
use crate::errors::PageError;
use crate::forms::{self, checked, done, text, FlashQuery, ListQuery};

#[derive(Debug, Deserialize)]
pub struct CompanyForm {
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CompanyForm {
    fn into_profile(self) -> CompanyProfile {
        CompanyProfile {
            name: self.name,
            contact_name: text(self.contact_name),
            phone: text(self.phone),
            email: text(self.email),
            address: text(self.address),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyForm {
    #[serde(flatten)]
    pub company: CompanyForm,
    pub service_end_date: Option<String>,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionForm {
    pub service_end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveForm {
    pub is_active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

#[derive(Serialize)]
pub struct CompanyList {
    #[serde(flatten)]
    pub page: Page<company::Model>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[derive(Serialize)]
pub struct CompanyDetail {
    pub company: company::Model,
    pub expired: bool,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[utoipa::path(get, path = "/companies", tag = "companies", responses((status = 200, description = "Companies page")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(q): Query<ListQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<CompanyList>, PageError> {
    let page = company_service::list_companies(&state.db, &ctx, q.search(), q.pagination()).await?;
    Ok(Json(CompanyList { page, flash }))
}

#[utoipa::path(post, path = "/companies", tag = "companies", responses((status = 303, description = "Created"), (status = 422, description = "Validation errors")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<CreateCompanyForm>,
) -> Result<Redirect, PageError> {
    let service_end_date = forms::parse_date("service_end_date", form.service_end_date.as_deref())?;
    let input = CreateCompanyInput {
        profile: form.company.into_profile(),
        service_end_date,
        username: form.username,
        password: form.password,
    };
    company_service::create_company(&state.db, &ctx, input).await?;
    Ok(done("/companies", "created"))
}

pub async fn show(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<CompanyDetail>, PageError> {
    let company = company_service::get_company(&state.db, &ctx, id).await?;
    let expired = company.is_expired_on(service::subscription::today());
    Ok(Json(CompanyDetail { company, expired, flash }))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<CompanyForm>,
) -> Result<Redirect, PageError> {
    company_service::update_company_profile(&state.db, &ctx, id, form.into_profile()).await?;
    Ok(done(&format!("/companies/{id}"), "updated"))
}

pub async fn extend(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<SubscriptionForm>,
) -> Result<Redirect, PageError> {
    let end = forms::parse_date("service_end_date", Some(&form.service_end_date))?
        .ok_or_else(|| ServiceError::invalid("service_end_date", "required"))?;
    company_service::extend_subscription(&state.db, &ctx, id, end).await?;
    Ok(done(&format!("/companies/{id}"), "subscription_extended"))
}

pub async fn set_active(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<ActiveForm>,
) -> Result<Redirect, PageError> {
    company_service::set_company_active(&state.db, &ctx, id, checked(&form.is_active)).await?;
    Ok(done(&format!("/companies/{id}"), "updated"))
}

pub async fn change_password(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect, PageError> {
    company_service::change_company_password(&state.db, &ctx, id, &form.password).await?;
    Ok(done(&format!("/companies/{id}"), "password_changed"))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<Redirect, PageError> {
    company_service::delete_company(&state.db, &ctx, id).await?;
    Ok(done("/companies", "deleted"))
}

/// The signed-in company admin's own company.
fn own_company(ctx: &AuthContext) -> Result<i32, PageError> {
    ctx.company_id()
        .filter(|_| !ctx.scope.is_super_admin())
        .ok_or_else(|| ServiceError::forbidden("company settings need a company session").into())
}

pub async fn settings_page(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<CompanyDetail>, PageError> {
    let id = own_company(&ctx)?;
    let company = company_service::get_company(&state.db, &ctx, id).await?;
    let expired = company.is_expired_on(service::subscription::today());
    Ok(Json(CompanyDetail { company, expired, flash }))
}

/// Profile edit for the company admin; the subscription end date is not part of this form.
pub async fn settings_save(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<CompanyForm>,
) -> Result<Redirect, PageError> {
    let id = own_company(&ctx)?;
    company_service::update_company_profile(&state.db, &ctx, id, form.into_profile()).await?;
    Ok(done("/company/settings", "updated"))
}

pub async fn settings_password(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect, PageError> {
    let id = own_company(&ctx)?;
    company_service::change_company_password(&state.db, &ctx, id, &form.password).await?;
    Ok(done("/company/settings", "password_changed"))
}
