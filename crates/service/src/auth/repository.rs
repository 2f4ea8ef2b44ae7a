use async_trait::async_trait;

use super::domain::{Account, AuthUser, LoginKind};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_account(&self, kind: LoginKind, username: &str) -> Result<Option<Account>, AuthError>;

    async fn count_admins(&self) -> Result<u64, AuthError>;
    async fn create_admin(&self, username: &str, name: &str, password_hash: String) -> Result<AuthUser, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use models::role::Role;

    #[derive(Default)]
    pub struct MockAuthRepository {
        accounts: Mutex<HashMap<(LoginKind, String), Account>>, // key: (kind, username)
    }

    impl MockAuthRepository {
        /// Store an account directly (tests and doc examples).
        pub fn insert(&self, account: Account) {
            let key = (account.user.kind, account.user.username.clone());
            self.accounts.lock().unwrap().insert(key, account);
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_account(&self, kind: LoginKind, username: &str) -> Result<Option<Account>, AuthError> {
            let accounts = self.accounts.lock().unwrap();
            Ok(accounts.get(&(kind, username.to_string())).cloned())
        }

        async fn count_admins(&self) -> Result<u64, AuthError> {
            let accounts = self.accounts.lock().unwrap();
            Ok(accounts.keys().filter(|(k, _)| *k == LoginKind::Admin).count() as u64)
        }

        async fn create_admin(&self, username: &str, name: &str, password_hash: String) -> Result<AuthUser, AuthError> {
            let mut accounts = self.accounts.lock().unwrap();
            let key = (LoginKind::Admin, username.to_string());
            if accounts.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser {
                id: accounts.len() as i32 + 1,
                kind: LoginKind::Admin,
                username: username.to_string(),
                name: name.to_string(),
                role: Role::SuperAdmin,
                company_id: None,
                branch_id: None,
                company_name: None,
            };
            accounts.insert(key, Account { user: user.clone(), password_hash, active: true });
            Ok(user)
        }
    }
}
