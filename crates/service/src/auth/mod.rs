//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Dashboard registration, login and session tokens for business users.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod token;
pub mod repo;

pub use service::AuthService;
pub use token::Claims;
