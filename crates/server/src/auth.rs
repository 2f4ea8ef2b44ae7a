use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use tracing::{debug, warn};

use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::{AuthContext, AuthService};
use service::subscription::{self, GateStatus};
use service::ServiceError;

use crate::errors::PageError;

pub const AUTH_COOKIE: &str = "auth_token";
pub const LOGIN_PATH: &str = "/login";
pub const EXPIRED_PATH: &str = "/service-expired";

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub secure_cookie: bool,
}

impl ServerState {
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(AUTH_COOKIE, token);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure_cookie);
        cookie.set_same_site(SameSite::Lax);
        cookie
    }
}

/// Removal cookie matching the path the session cookie was set with.
pub fn expired_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    cookie
}

/// Token from the session cookie, or an `Authorization: Bearer` header.
fn session_token(jar: &CookieJar, req: &Request) -> Option<String> {
    if let Some(c) = jar.get(AUTH_COOKIE) {
        return Some(c.value().to_string());
    }
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Resolve the session into an `AuthContext` request extension; anonymous
/// or invalid sessions are sent to the login page.
pub async fn require_session(State(state): State<ServerState>, jar: CookieJar, mut req: Request, next: Next) -> Response {
    let Some(token) = session_token(&jar, &req) else {
        return Redirect::to(LOGIN_PATH).into_response();
    };
    match state.auth.verify_token(&token) {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(e) => {
            debug!(error = %e, code = e.code(), path = %req.uri().path(), "session rejected");
            (jar.remove(expired_cookie()), Redirect::to(LOGIN_PATH)).into_response()
        }
    }
}

/// Lock companies whose subscription has lapsed out of every page behind this layer.
/// Must run after `require_session`.
pub async fn subscription_gate(State(state): State<ServerState>, jar: CookieJar, req: Request, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<AuthContext>().cloned() else {
        return Redirect::to(LOGIN_PATH).into_response();
    };
    match subscription::check(&state.db, &ctx, subscription::today()).await {
        Ok(GateStatus::Open) => next.run(req).await,
        Ok(GateStatus::Expired { .. }) => Redirect::to(EXPIRED_PATH).into_response(),
        Err(ServiceError::Forbidden(reason)) => {
            // 公司被停用或删除，会话作废
            warn!(event = "session_company_unavailable", company_id = ?ctx.company_id(), %reason);
            let target = common::types::Flash::Error("account_disabled".into()).redirect_target(LOGIN_PATH);
            (jar.remove(expired_cookie()), Redirect::to(&target)).into_response()
        }
        Err(e) => PageError::from(e).into_response(),
    }
}
