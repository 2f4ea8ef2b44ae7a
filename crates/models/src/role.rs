use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Session role; decides the maximal visible scope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    CompanyAdmin,
    BranchManager,
    Technician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::CompanyAdmin => "company_admin",
            Role::BranchManager => "branch_manager",
            Role::Technician => "technician",
        }
    }

    /// Roles that can be stored on a personnel row.
    pub fn is_personnel_role(&self) -> bool {
        matches!(self, Role::BranchManager | Role::Technician)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "super_admin" => Ok(Role::SuperAdmin),
            "company_admin" => Ok(Role::CompanyAdmin),
            "branch_manager" => Ok(Role::BranchManager),
            "technician" => Ok(Role::Technician),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
