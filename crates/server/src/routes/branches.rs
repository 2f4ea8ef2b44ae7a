use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::{Extension, Form, Json};
use serde::{Deserialize, Serialize};

use models::branch::{self, BranchProfile};
use service::auth::AuthContext;
use service::branch_service::{self, CreateBranchInput};
use service::pagination::Page;

use crate::auth::ServerState;
use crate::errors::PageError;
use crate::forms::{checked, done, empty_string_as_none, text, FlashQuery, ListQuery};

#[derive(Debug, Deserialize)]
pub struct BranchForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub company_id: Option<i32>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<String>,
}

impl BranchForm {
    fn profile(&self) -> BranchProfile {
        BranchProfile {
            name: self.name.clone(),
            phone: text(self.phone.clone()),
            email: text(self.email.clone()),
            address: text(self.address.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

#[derive(Serialize)]
pub struct BranchList {
    #[serde(flatten)]
    pub page: Page<branch::Model>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[derive(Serialize)]
pub struct BranchDetail {
    pub branch: branch::Model,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[utoipa::path(get, path = "/branches", tag = "branches", responses((status = 200, description = "Branches page")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(q): Query<ListQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<BranchList>, PageError> {
    let page = branch_service::list_branches(&state.db, &ctx, q.pagination()).await?;
    Ok(Json(BranchList { page, flash }))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<BranchForm>,
) -> Result<Redirect, PageError> {
    let input = CreateBranchInput {
        company_id: form.company_id,
        profile: form.profile(),
        username: form.username.unwrap_or_default(),
        password: form.password.unwrap_or_default(),
    };
    branch_service::create_branch(&state.db, &ctx, input).await?;
    Ok(done("/branches", "created"))
}

pub async fn show(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<BranchDetail>, PageError> {
    let branch = branch_service::get_branch(&state.db, &ctx, id).await?;
    Ok(Json(BranchDetail { branch, flash }))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<BranchForm>,
) -> Result<Redirect, PageError> {
    branch_service::update_branch(&state.db, &ctx, id, form.profile(), Some(checked(&form.is_active))).await?;
    Ok(done(&format!("/branches/{id}"), "updated"))
}

pub async fn change_password(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect, PageError> {
    branch_service::change_branch_password(&state.db, &ctx, id, &form.password).await?;
    Ok(done(&format!("/branches/{id}"), "password_changed"))
}

#[utoipa::path(post, path = "/branches/{id}/delete", tag = "branches", params(("id" = i32, Path, description = "Branch id")), responses((status = 303, description = "Deleted, or denied")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<Redirect, PageError> {
    branch_service::delete_branch(&state.db, &ctx, id).await?;
    Ok(done("/branches", "deleted"))
}
