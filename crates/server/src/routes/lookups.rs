use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::{Extension, Form, Json};
use serde::Deserialize;

use models::device_model;
use service::auth::AuthContext;
use service::lookup_service::{self, LookupCatalog, LookupItem, LookupKind};

use crate::auth::ServerState;
use crate::errors::PageError;
use crate::forms::{done, empty_string_as_none};

#[derive(Debug, Deserialize)]
pub struct NameForm {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub brand_id: Option<i32>,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub brand_id: Option<i32>,
}

fn kind(segment: &str) -> Result<LookupKind, PageError> {
    LookupKind::parse(segment).ok_or_else(|| service::ServiceError::not_found("lookup list").into())
}

#[utoipa::path(get, path = "/lookups", tag = "lookups", responses((status = 200, description = "All catalogues")))]
pub async fn catalog(State(state): State<ServerState>) -> Result<Json<LookupCatalog>, PageError> {
    Ok(Json(lookup_service::catalog(&state.db).await?))
}

pub async fn list(State(state): State<ServerState>, Path(segment): Path<String>) -> Result<Json<Vec<LookupItem>>, PageError> {
    Ok(Json(lookup_service::list_lookup(&state.db, kind(&segment)?).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(segment): Path<String>,
    Form(form): Form<NameForm>,
) -> Result<Redirect, PageError> {
    lookup_service::create_lookup(&state.db, &ctx, kind(&segment)?, &form.name).await?;
    Ok(done(&format!("/lookups/{segment}"), "created"))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path((segment, id)): Path<(String, i32)>,
) -> Result<Redirect, PageError> {
    lookup_service::delete_lookup(&state.db, &ctx, kind(&segment)?, id).await?;
    Ok(done(&format!("/lookups/{segment}"), "deleted"))
}

/// Models, optionally of one brand (`?brand_id=`), for the dependent select box.
pub async fn list_models(State(state): State<ServerState>, Query(q): Query<ModelQuery>) -> Result<Json<Vec<device_model::Model>>, PageError> {
    Ok(Json(lookup_service::list_models(&state.db, q.brand_id).await?))
}

pub async fn create_model(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(form): Form<ModelForm>,
) -> Result<Redirect, PageError> {
    let brand_id = form.brand_id.ok_or_else(|| service::ServiceError::invalid("brand_id", "required"))?;
    lookup_service::create_model(&state.db, &ctx, brand_id, &form.name).await?;
    Ok(done("/lookups/models", "created"))
}

pub async fn delete_model(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<Redirect, PageError> {
    lookup_service::delete_model(&state.db, &ctx, id).await?;
    Ok(done("/lookups/models", "deleted"))
}
