//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult, ValidationError},
    models::{AccessToken, TokenClaims, TokenPair, TokenType, User, UserId},
    password::PepperedHasher,
    serializers::{LoginSerializer, UserSerializer},
    tokens::{TokenConfig, TokenIssuer},
    validation::{self, CharField},
};
use crate::db::UserRepository;
use serde_json::Value;
use std::sync::Arc;

/// Authentication manager
///
/// Single entry point for the HTTP layer: owns the credential store, the
/// password hasher, the token issuer and both serializers.
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    issuer: TokenIssuer,
    user_serializer: UserSerializer,
    login_serializer: LoginSerializer,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store
    /// * `pepper` - Server-side pepper for password hashing
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `tokens` - Access/refresh token lifetimes
    pub fn new(
        users: Arc<dyn UserRepository>,
        pepper: String,
        jwt_secret: &str,
        tokens: TokenConfig,
    ) -> Self {
        let hasher = PepperedHasher::new(pepper);
        let issuer = TokenIssuer::new(jwt_secret, tokens);

        Self {
            user_serializer: UserSerializer::new(users.clone(), hasher.clone()),
            login_serializer: LoginSerializer::new(users.clone(), hasher, issuer.clone()),
            users,
            issuer,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Missing, blank, malformed or duplicate field
    pub async fn register(&self, data: &Value) -> AuthResult<User> {
        let user = self.user_serializer.save(data).await?;
        log::info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Exchange email and password for a token pair
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Missing or blank field
    /// * `AuthError::InvalidCredentials` - Unknown email, wrong password or inactive account
    pub async fn login(&self, data: &Value) -> AuthResult<TokenPair> {
        self.login_serializer.validate(data).await
    }

    /// Mint a new access token from `{"refresh": "<token>"}`
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Missing or blank `refresh` field
    /// * `AuthError::InvalidToken` - Bad signature, expired, or not a refresh token
    pub async fn refresh(&self, data: &Value) -> AuthResult<AccessToken> {
        let data = validation::as_object(data)?;
        let mut errors = ValidationError::new();
        let token = CharField::required("refresh").read(data, &mut errors);

        match token {
            Some(token) => self.issuer.refresh(&token),
            None => Err(errors.into()),
        }
    }

    /// Verify an access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<TokenClaims> {
        self.issuer.verify(token, TokenType::Access)
    }

    /// Load the active user an access token belongs to
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - The user was removed or deactivated
    pub async fn current_user(&self, user_id: UserId) -> AuthResult<User> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AuthError::UserNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserRepository;
    use serde_json::json;

    fn manager() -> AuthManager {
        AuthManager::new(
            Arc::new(MemoryUserRepository::new()),
            "test_pepper_value".to_string(),
            "test_secret_key_for_testing_only_0123456789",
            TokenConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_register_login_and_resolve_user() {
        let auth = manager();
        let user = auth
            .register(&json!({ "email": "a@x.com", "password": "p1", "first_name": "A" }))
            .await
            .unwrap();

        let pair = auth
            .login(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();
        let claims = auth.verify_access_token(&pair.access).unwrap();
        let current = auth.current_user(claims.user_id).await.unwrap();

        assert_eq!(current.id, user.id);
        assert_eq!(current.first_name, "A");
    }

    #[tokio::test]
    async fn test_refresh_flow() {
        let auth = manager();
        auth.register(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();
        let pair = auth
            .login(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();

        let fresh = auth.refresh(&json!({ "refresh": pair.refresh })).await.unwrap();
        assert!(auth.verify_access_token(&fresh.access).is_ok());

        let wrong_type = auth.refresh(&json!({ "refresh": pair.access })).await;
        assert!(matches!(wrong_type, Err(AuthError::InvalidToken)));

        let missing = auth.refresh(&json!({})).await;
        assert!(matches!(missing, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let auth = manager();
        auth.register(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();
        let pair = auth
            .login(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();

        assert!(matches!(
            auth.verify_access_token(&pair.refresh),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_current_user_unknown_id() {
        let auth = manager();
        assert!(matches!(
            auth.current_user(404).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
