//! Payload validation and shaping for registration and login.

use super::{
    errors::{AuthError, AuthResult, ValidationError},
    models::{Credentials, LoginRequest, NewUser, RegisterRequest, TokenPair, User},
    password::PepperedHasher,
    tokens::TokenIssuer,
    validation::{
        self, CharField, EMAIL_MAX_LENGTH, NAME_MAX_LENGTH, PASSWORD_MAX_LENGTH,
    },
};
use crate::db::UserRepository;
use serde_json::Value;
use std::sync::Arc;

const EMAIL: CharField = CharField::required("email").max_length(EMAIL_MAX_LENGTH);
const PASSWORD: CharField = CharField::required("password")
    .max_length(PASSWORD_MAX_LENGTH)
    .keep_whitespace();
const FIRST_NAME: CharField = CharField::optional("first_name").max_length(NAME_MAX_LENGTH);
const LAST_NAME: CharField = CharField::optional("last_name").max_length(NAME_MAX_LENGTH);

/// Validates registration payloads and creates the user record.
#[derive(Clone)]
pub struct UserSerializer {
    users: Arc<dyn UserRepository>,
    hasher: PepperedHasher,
}

impl UserSerializer {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PepperedHasher) -> Self {
        Self { users, hasher }
    }

    /// Check every field of `data`, including email uniqueness.
    ///
    /// All failing fields are reported together.
    pub async fn validate(&self, data: &Value) -> AuthResult<RegisterRequest> {
        let data = validation::as_object(data)?;
        let mut errors = ValidationError::new();

        let email = EMAIL.read(data, &mut errors);
        let password = PASSWORD.read(data, &mut errors);
        let first_name = FIRST_NAME.read(data, &mut errors);
        let last_name = LAST_NAME.read(data, &mut errors);

        // Uniqueness is only worth a store round-trip for a well-formed email.
        let email = match email {
            Some(email) if !validation::is_valid_email(&email) => {
                errors.add(EMAIL.name(), validation::INVALID_EMAIL);
                None
            }
            Some(email) => {
                if self.users.email_exists(&email).await? {
                    errors.add(EMAIL.name(), validation::NOT_UNIQUE);
                    None
                } else {
                    Some(email)
                }
            }
            None => None,
        };

        match (email, password, first_name, last_name) {
            (Some(email), Some(password), Some(first_name), Some(last_name))
                if errors.is_empty() =>
            {
                Ok(RegisterRequest {
                    email,
                    password,
                    first_name,
                    last_name,
                })
            }
            _ => Err(errors.into()),
        }
    }

    /// Persist a validated request. The username is the email.
    pub async fn create(&self, request: RegisterRequest) -> AuthResult<User> {
        let password_hash = self.hasher.hash(&request.password)?;

        let new_user = NewUser {
            username: request.email.clone(),
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
        };

        self.users.create_user(new_user).await.map_err(|e| match e {
            AuthError::EmailTaken => {
                ValidationError::field(EMAIL.name(), validation::NOT_UNIQUE).into()
            }
            other => other,
        })
    }

    /// Validate then create.
    pub async fn save(&self, data: &Value) -> AuthResult<User> {
        let request = self.validate(data).await?;
        self.create(request).await
    }
}

/// Exchanges `{email, password}` for a token pair.
#[derive(Clone)]
pub struct LoginSerializer {
    users: Arc<dyn UserRepository>,
    hasher: PepperedHasher,
    issuer: TokenIssuer,
}

impl LoginSerializer {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PepperedHasher, issuer: TokenIssuer) -> Self {
        Self {
            users,
            hasher,
            issuer,
        }
    }

    /// Shape check only; no store access.
    pub fn validate_input(data: &Value) -> Result<LoginRequest, ValidationError> {
        let data = validation::as_object(data)?;
        let mut errors = ValidationError::new();

        let email = CharField::required("email").read(data, &mut errors);
        let password = CharField::required("password")
            .keep_whitespace()
            .read(data, &mut errors);

        match (email, password) {
            (Some(email), Some(password)) => Ok(LoginRequest { email, password }),
            _ => Err(errors),
        }
    }

    /// Authenticate and issue a fresh token pair.
    pub async fn validate(&self, data: &Value) -> AuthResult<TokenPair> {
        let request = Self::validate_input(data)?;
        self.obtain_pair(request.into()).await
    }

    /// Look the user up by username, check the password and the active
    /// flag, then sign a pair.
    pub async fn obtain_pair(&self, credentials: Credentials) -> AuthResult<TokenPair> {
        let Some(user) = self.users.find_by_username(&credentials.username).await? else {
            self.hasher.burn(&credentials.password);
            return Err(AuthError::InvalidCredentials);
        };

        self.hasher.verify(&credentials.password, &user.password_hash)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        self.issuer.issue_pair(user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenConfig, TokenType, UserRepresentation};
    use crate::db::MemoryUserRepository;
    use serde_json::json;

    const SECRET: &str = "test_secret_key_for_testing_only_0123456789";

    fn serializers() -> (Arc<MemoryUserRepository>, UserSerializer, LoginSerializer, TokenIssuer) {
        let repo = Arc::new(MemoryUserRepository::new());
        let hasher = PepperedHasher::new("test_pepper_value".to_string());
        let issuer = TokenIssuer::new(SECRET, TokenConfig::default());
        (
            repo.clone(),
            UserSerializer::new(repo.clone(), hasher.clone()),
            LoginSerializer::new(repo, hasher, issuer.clone()),
            issuer,
        )
    }

    fn validation_error(result: AuthResult<impl std::fmt::Debug>) -> ValidationError {
        match result {
            Err(AuthError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_creates_user_with_email_as_username() {
        let (repo, users, _, _) = serializers();

        let user = users
            .save(&json!({
                "email": "a@x.com",
                "password": "p1",
                "first_name": "A",
                "last_name": "X"
            }))
            .await
            .unwrap();

        assert_eq!(user.username, "a@x.com");
        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password_hash, "p1");
        assert_eq!(repo.len(), 1);

        let representation = serde_json::to_value(UserRepresentation::from(&user)).unwrap();
        assert_eq!(
            representation,
            json!({ "id": user.id, "email": "a@x.com", "first_name": "A", "last_name": "X" })
        );
        assert!(representation.get("password").is_none());
    }

    #[tokio::test]
    async fn test_register_names_are_optional() {
        let (_, users, _, _) = serializers();
        let user = users
            .save(&json!({ "email": "b@x.com", "password": "p1" }))
            .await
            .unwrap();
        assert_eq!(user.first_name, "");
        assert_eq!(user.last_name, "");
    }

    #[tokio::test]
    async fn test_register_reports_all_missing_fields() {
        let (repo, users, _, _) = serializers();

        let errors = validation_error(users.save(&json!({})).await);
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["email", "password"]);
        assert_eq!(errors.messages("email").unwrap(), [validation::REQUIRED]);
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_register_blank_and_invalid_email() {
        let (_, users, _, _) = serializers();

        let errors = validation_error(users.save(&json!({ "email": "", "password": "p" })).await);
        assert_eq!(errors.messages("email").unwrap(), [validation::NOT_BLANK]);

        let errors =
            validation_error(users.save(&json!({ "email": "nope", "password": "p" })).await);
        assert_eq!(errors.messages("email").unwrap(), [validation::INVALID_EMAIL]);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (repo, users, _, _) = serializers();
        let payload = json!({ "email": "a@x.com", "password": "p1" });

        users.save(&payload).await.unwrap();
        let errors = validation_error(users.save(&payload).await);

        assert_eq!(errors.messages("email").unwrap(), [validation::NOT_UNIQUE]);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_create_maps_store_conflict_to_field_error() {
        let (_, users, _, _) = serializers();
        let request = users
            .validate(&json!({ "email": "race@x.com", "password": "p1" }))
            .await
            .unwrap();

        users.create(request.clone()).await.unwrap();
        let errors = validation_error(users.create(request).await);
        assert_eq!(errors.messages("email").unwrap(), [validation::NOT_UNIQUE]);
    }

    #[tokio::test]
    async fn test_register_rejects_non_object() {
        let (_, users, _, _) = serializers();
        let errors = validation_error(users.save(&json!(["a@x.com"])).await);
        assert!(errors.has_field(ValidationError::NON_FIELD_ERRORS));
    }

    #[tokio::test]
    async fn test_login_success_returns_pair_for_user() {
        let (_, users, login, issuer) = serializers();
        let user = users
            .save(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();

        let pair = login
            .validate(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();

        assert!(!pair.access.is_empty());
        assert!(!pair.refresh.is_empty());
        let claims = issuer.verify(&pair.access, TokenType::Access).unwrap();
        assert_eq!(claims.user_id, user.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email() {
        let (_, users, login, _) = serializers();
        users
            .save(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();

        let wrong = login
            .validate(&json!({ "email": "a@x.com", "password": "nope" }))
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let unknown = login
            .validate(&json!({ "email": "ghost@x.com", "password": "p1" }))
            .await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_inactive_user_is_refused() {
        let (repo, users, login, _) = serializers();
        let user = users
            .save(&json!({ "email": "a@x.com", "password": "p1" }))
            .await
            .unwrap();
        repo.set_active(user.id, false).unwrap();

        let result = login
            .validate(&json!({ "email": "a@x.com", "password": "p1" }))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_login_input_maps_email_to_username() {
        let request =
            LoginSerializer::validate_input(&json!({ "email": "a@x.com", "password": "p1" }))
                .unwrap();
        let credentials = Credentials::from(request);
        assert_eq!(credentials.username, "a@x.com");
        assert_eq!(credentials.password, "p1");
    }

    #[test]
    fn test_login_input_requires_both_fields() {
        let errors = LoginSerializer::validate_input(&json!({ "username": "a@x.com" })).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["email", "password"]);
    }
}
