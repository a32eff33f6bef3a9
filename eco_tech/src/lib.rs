//! # eco_tech
//!
//! Account registration and token-based login for the eco_tech API.
//!
//! ## Core Modules
//!
//! - [`auth`]: user/login serializers, password hashing, token issuance
//! - [`db`]: PostgreSQL pool and the credential store
//!
//! The HTTP surface lives in the `eco_server` crate.

/// Registration, login and token handling.
pub mod auth;
pub use auth::{AuthError, AuthManager, AuthResult, ValidationError};

/// Connection pooling and user persistence.
pub mod db;
