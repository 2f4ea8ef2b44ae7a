use models::role::Role;
use serde::Serialize;

use super::domain::LoginKind;
use crate::scope::Scope;

/// Who is calling, resolved once per request from the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    /// Row id in the table selected by `user_type`.
    pub user_id: i32,
    pub user_type: LoginKind,
    #[serde(skip)]
    pub scope: Scope,
    pub display_name: String,
    pub company_name: Option<String>,
}

impl AuthContext {
    pub fn new(user_id: i32, user_type: LoginKind, scope: Scope, display_name: impl Into<String>) -> Self {
        Self { user_id, user_type, scope, display_name: display_name.into(), company_name: None }
    }

    pub fn role(&self) -> Role { self.scope.role() }

    pub fn company_id(&self) -> Option<i32> { self.scope.company_id() }

    pub fn branch_id(&self) -> Option<i32> { self.scope.branch_id() }

    /// Personnel id of the caller when logged in through the personnel form.
    pub fn personnel_id(&self) -> Option<i32> {
        (self.user_type == LoginKind::Personnel).then_some(self.user_id)
    }
}
