//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Login for the four account kinds, session token issue/verify and the
//! request-scoped [`context::AuthContext`].

pub mod context;
pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use context::AuthContext;
pub use service::{hash_password, verify_password, AuthConfig, AuthService};
