use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::{Extension, Form, Json};
use serde::{Deserialize, Serialize};

use models::personnel::{self, PersonnelProfile};
use models::role::Role;
use service::auth::AuthContext;
use service::pagination::Page;
use service::personnel_service::{self, CreatePersonnelInput, PersonnelFilter, UpdatePersonnelInput};
use service::{branch_service, ServiceError};

use crate::auth::ServerState;
use crate::errors::PageError;
use crate::forms::{checked, done, empty_string_as_none, text, FlashQuery, ListQuery};

#[derive(Debug, Deserialize)]
pub struct PersonnelForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub company_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub branch_id: Option<i32>,
    pub role: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<String>,
}

impl PersonnelForm {
    fn role(&self) -> Result<Role, ServiceError> {
        self.role.parse::<Role>().map_err(|e| ServiceError::invalid("role", e))
    }

    fn profile(&self) -> PersonnelProfile {
        PersonnelProfile { name: self.name.clone(), phone: text(self.phone.clone()), email: text(self.email.clone()) }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PersonnelQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub branch_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

#[derive(Serialize)]
pub struct PersonnelList {
    #[serde(flatten)]
    pub page: Page<personnel::Model>,
    /// Branch choices for the filter and the create form.
    pub branches: Vec<models::branch::Model>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[derive(Serialize)]
pub struct PersonnelDetail {
    pub personnel: personnel::Model,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[utoipa::path(get, path = "/personnel", tag = "personnel", responses((status = 200, description = "Personnel page")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(q): Query<ListQuery>,
    Query(filter): Query<PersonnelQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<PersonnelList>, PageError> {
    let filter = PersonnelFilter { role: filter.role, branch_id: filter.branch_id };
    let page = personnel_service::list_personnel(&state.db, &ctx, filter, q.pagination()).await?;
    let branches = branch_service::branch_options(&state.db, &ctx).await?;
    Ok(Json(PersonnelList { page, branches, flash }))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<PersonnelForm>,
) -> Result<Redirect, PageError> {
    let input = CreatePersonnelInput {
        company_id: form.company_id,
        branch_id: form.branch_id,
        role: form.role()?,
        profile: form.profile(),
        username: form.username.clone().unwrap_or_default(),
        password: form.password.clone().unwrap_or_default(),
    };
    personnel_service::create_personnel(&state.db, &ctx, input).await?;
    Ok(done("/personnel", "created"))
}

pub async fn show(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<PersonnelDetail>, PageError> {
    let personnel = personnel_service::get_personnel(&state.db, &ctx, id).await?;
    Ok(Json(PersonnelDetail { personnel, flash }))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<PersonnelForm>,
) -> Result<Redirect, PageError> {
    let input = UpdatePersonnelInput {
        profile: form.profile(),
        role: form.role()?,
        branch_id: form.branch_id,
        is_active: checked(&form.is_active),
    };
    personnel_service::update_personnel(&state.db, &ctx, id, input).await?;
    Ok(done(&format!("/personnel/{id}"), "updated"))
}

pub async fn change_password(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect, PageError> {
    personnel_service::change_personnel_password(&state.db, &ctx, id, &form.password).await?;
    Ok(done(&format!("/personnel/{id}"), "password_changed"))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<Redirect, PageError> {
    personnel_service::delete_personnel(&state.db, &ctx, id).await?;
    Ok(done("/personnel", "deleted"))
}
