use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::{Extension, Form, Json};
use serde::Serialize;

use models::system_setting;
use service::auth::AuthContext;
use service::settings_service;

use crate::auth::ServerState;
use crate::errors::PageError;
use crate::forms::{done, FlashQuery};

#[derive(Serialize)]
pub struct SettingsPage {
    pub settings: Vec<system_setting::Model>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

#[utoipa::path(get, path = "/settings", tag = "settings", responses((status = 200, description = "System settings")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<SettingsPage>, PageError> {
    let settings = settings_service::list_settings(&state.db, &ctx).await?;
    Ok(Json(SettingsPage { settings, flash }))
}

pub async fn show(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(key): Path<String>,
) -> Result<Json<system_setting::Model>, PageError> {
    Ok(Json(settings_service::get_setting(&state.db, &ctx, &key).await?))
}

/// Every submitted `key=value` pair is upserted.
#[utoipa::path(post, path = "/settings", tag = "settings", responses((status = 303, description = "Saved"), (status = 422, description = "Invalid key")))]
pub async fn save(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, PageError> {
    settings_service::save_settings(&state.db, &ctx, pairs).await?;
    Ok(done("/settings", "saved"))
}
