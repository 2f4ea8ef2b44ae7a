use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use models::role::Role;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::context::AuthContext;
use super::domain::{AuthSession, AuthUser, LoginInput, LoginKind};
use super::errors::AuthError;
use super::repository::AuthRepository;
use crate::scope::Scope;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_hours: i64,
}

/// Session token claims. Written once at login and never refreshed.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    uid: i32,
    ut: LoginKind,
    role: Role,
    cid: Option<i32>,
    bid: Option<i32>,
    name: String,
    cname: Option<String>,
    iat: i64,
    exp: i64,
}

/// Hash a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    pub fn session_hours(&self) -> i64 { self.cfg.session_hours }

    /// Authenticate an account and issue a session token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::{AuthRepository, mock::MockAuthRepository}};
    /// use service::auth::domain::{LoginInput, LoginKind};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig { jwt_secret: "0123456789abcdef".into(), session_hours: 12 });
    /// let hash = service::auth::hash_password("Passw0rd!").unwrap();
    /// tokio_test::block_on(repo.create_admin("root", "Root", hash)).unwrap();
    /// let session = tokio_test::block_on(svc.login(LoginInput { kind: LoginKind::Admin, username: "root".into(), password: "Passw0rd!".into() })).unwrap();
    /// assert_eq!(session.user.username, "root");
    /// let ctx = svc.verify_token(&session.token).unwrap();
    /// assert!(ctx.scope.is_super_admin());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username, user_type = %input.kind))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let account = self.repo
            .find_account(input.kind, &input.username)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !verify_password(&input.password, &account.password_hash)? {
            debug!("password mismatch");
            return Err(AuthError::Unauthorized);
        }
        if !account.active {
            warn!(event = "login_inactive", user_id = account.user.id);
            return Err(AuthError::Unauthorized);
        }

        let (token, expires_at) = self.issue_token(&account.user)?;
        info!(event = "login", user_id = account.user.id, role = %account.user.role, company_id = ?account.user.company_id);
        Ok(AuthSession { user: account.user, token, expires_at })
    }

    /// Sign a token for `user`; returns it with its expiry.
    pub fn issue_token(&self, user: &AuthUser) -> Result<(String, chrono::DateTime<Utc>), AuthError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.cfg.session_hours);
        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            ut: user.kind,
            role: user.role,
            cid: user.company_id,
            bid: user.branch_id,
            name: user.name.clone(),
            cname: user.company_name.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok((token, expires_at))
    }

    /// Validate a session token and rebuild the caller's context.
    pub fn verify_token(&self, token: &str) -> Result<AuthContext, AuthError> {
        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()), &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::InvalidSession
            })?;
        let c = data.claims;
        let scope = Scope::new(c.role, c.cid, c.bid).map_err(|_| AuthError::InvalidSession)?;
        Ok(AuthContext { user_id: c.uid, user_type: c.ut, scope, display_name: c.name, company_name: c.cname })
    }

    /// Create the first super admin when the `admins` table is empty.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_super_admin(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        if self.repo.count_admins().await? > 0 {
            return Ok(false);
        }
        if password.len() < models::validation::MIN_PASSWORD_LEN {
            return Err(AuthError::Validation("initial admin password too short".into()));
        }
        let hash = hash_password(password)?;
        let user = self.repo.create_admin(username, "Administrator", hash).await?;
        info!(event = "super_admin_created", user_id = user.id, username = %user.username);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::Account;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc(repo: Arc<MockAuthRepository>) -> AuthService<MockAuthRepository> {
        AuthService::new(repo, AuthConfig { jwt_secret: "unit-test-secret-0123".into(), session_hours: 12 })
    }

    fn technician(active: bool) -> Account {
        Account {
            user: AuthUser {
                id: 42,
                kind: LoginKind::Personnel,
                username: "tech".into(),
                name: "Tech".into(),
                role: Role::Technician,
                company_id: Some(5),
                branch_id: Some(3),
                company_name: Some("Acme".into()),
            },
            password_hash: hash_password("Passw0rd!").unwrap(),
            active,
        }
    }

    #[tokio::test]
    async fn login_issues_token_with_scope() {
        let repo = Arc::new(MockAuthRepository::default());
        repo.insert(technician(true));
        let svc = svc(repo);
        let session = svc
            .login(LoginInput { kind: LoginKind::Personnel, username: "tech".into(), password: "Passw0rd!".into() })
            .await
            .unwrap();
        let ctx = svc.verify_token(&session.token).unwrap();
        assert_eq!(ctx.user_id, 42);
        assert_eq!(ctx.scope, Scope::technician(5, Some(3)));
        assert_eq!(ctx.personnel_id(), Some(42));
        assert_eq!(ctx.company_name.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn wrong_password_and_wrong_kind_are_unauthorized() {
        let repo = Arc::new(MockAuthRepository::default());
        repo.insert(technician(true));
        let svc = svc(repo);
        let bad = svc.login(LoginInput { kind: LoginKind::Personnel, username: "tech".into(), password: "nope-nope".into() }).await;
        assert!(matches!(bad, Err(AuthError::Unauthorized)));
        let kind = svc.login(LoginInput { kind: LoginKind::Branch, username: "tech".into(), password: "Passw0rd!".into() }).await;
        assert!(matches!(kind, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn inactive_account_cannot_log_in() {
        let repo = Arc::new(MockAuthRepository::default());
        repo.insert(technician(false));
        let res = svc(repo).login(LoginInput { kind: LoginKind::Personnel, username: "tech".into(), password: "Passw0rd!".into() }).await;
        assert!(matches!(res, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let repo = Arc::new(MockAuthRepository::default());
        let a = svc(repo.clone());
        let b = AuthService::new(repo, AuthConfig { jwt_secret: "another-secret-4567".into(), session_hours: 12 });
        let (token, _) = a.issue_token(&technician(true).user).unwrap();
        assert!(matches!(b.verify_token(&token), Err(AuthError::InvalidSession)));
        assert!(matches!(a.verify_token("not.a.token"), Err(AuthError::InvalidSession)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = AuthService::new(repo, AuthConfig { jwt_secret: "unit-test-secret-0123".into(), session_hours: -1 });
        let (token, _) = svc.issue_token(&technician(true).user).unwrap();
        assert!(matches!(svc.verify_token(&token), Err(AuthError::InvalidSession)));
    }

    #[tokio::test]
    async fn super_admin_bootstrap_runs_once() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = svc(repo.clone());
        assert!(svc.ensure_super_admin("root", "Passw0rd!").await.unwrap());
        assert!(!svc.ensure_super_admin("root2", "Passw0rd!").await.unwrap());
        assert_eq!(repo.count_admins().await.unwrap(), 1);
    }
}
