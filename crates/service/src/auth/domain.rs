use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use models::role::Role;
use serde::{Deserialize, Serialize};

/// Which credential table a login is checked against (`user_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginKind {
    Admin,
    Company,
    Branch,
    Personnel,
}

impl LoginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginKind::Admin => "admin",
            LoginKind::Company => "company",
            LoginKind::Branch => "branch",
            LoginKind::Personnel => "personnel",
        }
    }
}

impl FromStr for LoginKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(LoginKind::Admin),
            "company" => Ok(LoginKind::Company),
            "branch" => Ok(LoginKind::Branch),
            "personnel" => Ok(LoginKind::Personnel),
            other => Err(format!("unknown user_type: {other}")),
        }
    }
}

impl fmt::Display for LoginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub kind: LoginKind,
    pub username: String,
    pub password: String,
}

/// Authenticated principal (business view)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub kind: LoginKind,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub company_id: Option<i32>,
    pub branch_id: Option<i32>,
    pub company_name: Option<String>,
}

/// Stored account as seen by the login check.
#[derive(Debug, Clone)]
pub struct Account {
    pub user: AuthUser,
    pub password_hash: String,
    /// False when the account or its company is deactivated.
    pub active: bool,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
