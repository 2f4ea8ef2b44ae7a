use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Serialize;

use models::role::Role;
use service::auth::AuthContext;
use service::dashboard_service::{self, Summary, TechnicianDashboard};

use crate::auth::ServerState;
use crate::errors::PageError;
use crate::forms::FlashQuery;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardData {
    Technician(TechnicianDashboard),
    Summary(Summary),
}

#[derive(Serialize)]
pub struct DashboardPage {
    pub user: AuthContext,
    pub role: Role,
    pub data: DashboardData,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

/// Technicians get their own work list, everyone else the scoped summary.
#[utoipa::path(get, path = "/dashboard", tag = "dashboard", responses((status = 200, description = "Dashboard data"), (status = 303, description = "Not signed in, or subscription expired")))]
pub async fn show(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(flash): Query<FlashQuery>,
) -> Result<Json<DashboardPage>, PageError> {
    let data = match ctx.role() {
        Role::Technician => DashboardData::Technician(dashboard_service::technician_dashboard(&state.db, &ctx).await?),
        _ => DashboardData::Summary(dashboard_service::summary(&state.db, &ctx).await?),
    };
    Ok(Json(DashboardPage { role: ctx.role(), user: ctx, data, flash }))
}
