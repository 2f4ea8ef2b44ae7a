use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::types::Flash;
use service::auth::domain::{LoginInput, LoginKind};
use service::auth::errors::AuthError;
use service::auth::AuthContext;
use service::subscription::{self, GateStatus};

use crate::auth::{expired_cookie, ServerState, LOGIN_PATH};
use crate::errors::PageError;
use crate::forms::FlashQuery;

pub const PERSONNEL_LOGIN_PATH: &str = "/personnel/login";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub user_type: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonnelLoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginPage {
    pub user_types: Vec<&'static str>,
    #[serde(flatten)]
    pub flash: FlashQuery,
}

fn back_to(path: &str, reason: &str) -> Response {
    Redirect::to(&Flash::Error(reason.to_string()).redirect_target(path)).into_response()
}

/// Check credentials, set the session cookie and land on the dashboard.
async fn start_session(state: &ServerState, jar: CookieJar, input: LoginInput, failure_path: &str) -> Result<Response, PageError> {
    if input.username.trim().is_empty() || input.password.is_empty() {
        return Ok(back_to(failure_path, "missing_credentials"));
    }
    let kind = input.kind;
    match state.auth.login(input).await {
        Ok(session) => {
            let jar = jar.add(state.session_cookie(session.token));
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        Err(e @ AuthError::Unauthorized) => {
            info!(event = "login_failed", code = e.code(), user_type = %kind);
            Ok(back_to(failure_path, "invalid_credentials"))
        }
        Err(e) => Err(PageError::Service(e.into())),
    }
}

#[utoipa::path(get, path = "/login", tag = "auth", responses((status = 200, description = "Login page data")))]
pub async fn login_page(Query(flash): Query<FlashQuery>) -> Json<LoginPage> {
    Json(LoginPage { user_types: vec!["admin", "company", "branch"], flash })
}

/// Admin, company and branch logins share this form and pick the table with `user_type`.
#[utoipa::path(post, path = "/login", tag = "auth", request_body(content = crate::openapi::LoginRequest, content_type = "application/x-www-form-urlencoded"), responses((status = 303, description = "Dashboard on success, back to /login with ?error= otherwise")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Result<Response, PageError> {
    let kind = match form.user_type.parse::<LoginKind>() {
        Ok(k) if k != LoginKind::Personnel => k,
        _ => {
            warn!(user_type = %form.user_type, "login with unsupported user_type");
            return Ok(back_to(LOGIN_PATH, "invalid_user_type"));
        }
    };
    start_session(&state, jar, LoginInput { kind, username: form.username, password: form.password }, LOGIN_PATH).await
}

#[utoipa::path(get, path = "/personnel/login", tag = "auth", responses((status = 200, description = "Personnel login page data")))]
pub async fn personnel_login_page(Query(flash): Query<FlashQuery>) -> Json<FlashQuery> {
    Json(flash)
}

#[utoipa::path(post, path = "/personnel/login", tag = "auth", request_body(content = crate::openapi::PersonnelLoginRequest, content_type = "application/x-www-form-urlencoded"), responses((status = 303, description = "Dashboard on success")))]
pub async fn personnel_login(State(state): State<ServerState>, jar: CookieJar, Form(form): Form<PersonnelLoginForm>) -> Result<Response, PageError> {
    let input = LoginInput { kind: LoginKind::Personnel, username: form.username, password: form.password };
    start_session(&state, jar, input, PERSONNEL_LOGIN_PATH).await
}

#[utoipa::path(post, path = "/logout", tag = "auth", responses((status = 303, description = "Cookie cleared")))]
pub async fn logout(Extension(ctx): Extension<AuthContext>, jar: CookieJar) -> (CookieJar, Redirect) {
    info!(event = "logout", user_id = ctx.user_id, user_type = %ctx.user_type);
    let target = match ctx.user_type {
        LoginKind::Personnel => PERSONNEL_LOGIN_PATH,
        _ => LOGIN_PATH,
    };
    (jar.remove(expired_cookie()), Redirect::to(target))
}

#[derive(Serialize)]
pub struct ExpiredPage {
    pub company_name: Option<String>,
    #[serde(flatten)]
    pub gate: GateStatus,
}

/// Shown to every user of a lapsed company.
pub async fn service_expired(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> Result<Response, PageError> {
    match subscription::check(&state.db, &ctx, subscription::today()).await? {
        GateStatus::Open => Ok(Redirect::to("/dashboard").into_response()),
        gate => Ok(Json(ExpiredPage { company_name: ctx.company_name.clone(), gate }).into_response()),
    }
}

/// Who is signed in; used by the page shell.
pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<AuthContext> {
    Json(ctx)
}
