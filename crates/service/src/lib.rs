//! Service layer providing business-oriented operations on top of models.
//! - Every tenant read is narrowed by the caller's [`scope::Scope`].
//! - Reuses validation and entity definitions in `models` crate.
//! - Operations take an explicit [`auth::AuthContext`] instead of ambient session state.

pub mod errors;
pub mod auth;
pub mod scope;
pub mod subscription;
pub mod pagination;

pub mod company_service;
pub mod branch_service;
pub mod personnel_service;
pub mod customer_service;
pub mod ticket_service;
pub mod settings_service;
pub mod lookup_service;
pub mod dashboard_service;

#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
