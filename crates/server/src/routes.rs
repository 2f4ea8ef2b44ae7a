use axum::{
    middleware,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::auth::{require_session, subscription_gate, ServerState};
use crate::openapi::ApiDoc;

pub mod auth;
pub mod branches;
pub mod companies;
pub mod customers;
pub mod dashboard;
pub mod lookups;
pub mod personnel;
pub mod services;
pub mod settings;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public pages, session-only pages and
/// the gated application pages.
pub fn build_router(state: ServerState) -> Router {
    // Public routes
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/personnel/login", get(auth::personnel_login_page).post(auth::personnel_login));

    // 需要登录，但不受订阅到期限制
    let session_only = Router::new()
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/service-expired", get(auth::service_expired))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/me", get(auth::me))
        .route("/dashboard", get(dashboard::show))
        // companies (super admin)
        .route("/companies", get(companies::list).post(companies::create))
        .route("/companies/:id", get(companies::show).post(companies::update))
        .route("/companies/:id/subscription", post(companies::extend))
        .route("/companies/:id/active", post(companies::set_active))
        .route("/companies/:id/password", post(companies::change_password))
        .route("/companies/:id/delete", post(companies::delete))
        // own company (company admin)
        .route("/company/settings", get(companies::settings_page).post(companies::settings_save))
        .route("/company/settings/password", post(companies::settings_password))
        .route("/branches", get(branches::list).post(branches::create))
        .route("/branches/:id", get(branches::show).post(branches::update))
        .route("/branches/:id/password", post(branches::change_password))
        .route("/branches/:id/delete", post(branches::delete))
        .route("/personnel", get(personnel::list).post(personnel::create))
        .route("/personnel/:id", get(personnel::show).post(personnel::update))
        .route("/personnel/:id/password", post(personnel::change_password))
        .route("/personnel/:id/delete", post(personnel::delete))
        .route("/customers", get(customers::list).post(customers::create))
        .route("/customers/:id", get(customers::show).post(customers::update))
        .route("/customers/:id/delete", post(customers::delete))
        .route("/services", get(services::list).post(services::create))
        .route("/services/:id", get(services::show).post(services::update))
        .route("/services/:id/assign", post(services::assign))
        .route("/services/:id/status", post(services::set_status))
        .route("/services/:id/delete", post(services::delete))
        .route("/services/:id/receipt", get(services::receipt))
        .route("/settings", get(settings::list).post(settings::save))
        .route("/settings/:key", get(settings::show))
        .route("/lookups", get(lookups::catalog))
        .route("/lookups/models", get(lookups::list_models).post(lookups::create_model))
        .route("/lookups/models/:id/delete", post(lookups::delete_model))
        .route("/lookups/:kind", get(lookups::list).post(lookups::create))
        .route("/lookups/:kind/:id/delete", post(lookups::delete))
        // layers run bottom-up: session first, then the gate
        .route_layer(middleware::from_fn_with_state(state.clone(), subscription_gate))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    public
        .merge(session_only)
        .merge(app)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
