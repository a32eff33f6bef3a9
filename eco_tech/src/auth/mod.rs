//! Authentication module providing email/password registration and JWT login.
//!
//! This module implements:
//! - Field-level validation of registration and login payloads
//! - Argon2id password hashing with server-side pepper
//! - HS256 access tokens (5-minute expiry) and refresh tokens (1-day expiry)
//!
//! ## Example
//!
//! ```no_run
//! use eco_tech::auth::{AuthManager, TokenConfig};
//! use eco_tech::db::MemoryUserRepository;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = AuthManager::new(
//!         Arc::new(MemoryUserRepository::new()),
//!         "secret_pepper".to_string(),
//!         "jwt_secret",
//!         TokenConfig::default(),
//!     );
//!
//!     let user = auth
//!         .register(&json!({ "email": "a@x.com", "password": "p1" }))
//!         .await?;
//!     let tokens = auth
//!         .login(&json!({ "email": "a@x.com", "password": "p1" }))
//!         .await?;
//!     println!("Registered user {} with access token {}", user.id, tokens.access);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod serializers;
pub mod tokens;
pub mod validation;

pub use errors::{AuthError, AuthResult, ValidationError};
pub use manager::AuthManager;
pub use models::{
    AccessToken, Credentials, LoginRequest, NewUser, RegisterRequest, TokenClaims, TokenPair,
    TokenType, User, UserId, UserRepresentation,
};
pub use password::PepperedHasher;
pub use serializers::{LoginSerializer, UserSerializer};
pub use tokens::{TokenConfig, TokenIssuer};
