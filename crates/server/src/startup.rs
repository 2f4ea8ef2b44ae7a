use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use configs::AppConfig;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::{AuthConfig, AuthService};

use crate::auth::ServerState;
use crate::errors::StartupError;
use crate::routes;

/// Wire the shared state around an open connection.
pub fn build_state(db: DatabaseConnection, cfg: &configs::AuthConfig) -> ServerState {
    let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
    let auth = AuthService::new(repo, AuthConfig { jwt_secret: cfg.jwt_secret.clone(), session_hours: cfg.session_hours });
    ServerState { db, auth: Arc::new(auth), secure_cookie: cfg.secure_cookie }
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state)
}

/// Create the first super admin from `ADMIN_USERNAME`/`ADMIN_PASSWORD` when none exists.
async fn bootstrap_admin(state: &ServerState) -> Result<(), StartupError> {
    let username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let Ok(password) = env::var("ADMIN_PASSWORD") else {
        warn!("ADMIN_PASSWORD not set; skipping super admin bootstrap");
        return Ok(());
    };
    let created = state
        .auth
        .ensure_super_admin(&username, &password)
        .await
        .map_err(|e| StartupError::Bootstrap(e.to_string()))?;
    if created {
        info!(event = "super_admin_bootstrapped", %username);
    }
    Ok(())
}

/// Public entry: connect, migrate, build the app and serve until the task is dropped.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    migration::Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    info!(event = "migrations_applied");

    let state = build_state(db, &cfg.auth);
    bootstrap_admin(&state).await?;

    let app = build_app(state);
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))?;
    info!(%addr, "starting fieldservice server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
