//! Credential store: repository trait plus PostgreSQL and in-process
//! implementations.
//!
//! The trait is the seam between the serializers and persistence, so the
//! whole authentication flow can run against [`MemoryUserRepository`] in
//! tests without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use crate::auth::{AuthError, AuthResult, NewUser, User, UserId};

/// Trait for user/authentication repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Whether any user already has exactly this email
    async fn email_exists(&self, email: &str) -> AuthResult<bool>;

    /// Create a new user
    ///
    /// Fails with [`AuthError::EmailTaken`] if the username or email is
    /// already present, even when a concurrent request won the race past
    /// validation.
    async fn create_user(&self, new_user: NewUser) -> AuthResult<User>;

    /// Find user by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, is_active, date_joined";

/// Default PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        date_joined: row.get::<DateTime<Utc>, _>("date_joined"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn email_exists(&self, email: &str) -> AuthResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn create_user(&self, new_user: NewUser) -> AuthResult<User> {
        let query = format!(
            "INSERT INTO users (username, email, first_name, last_name, password_hash)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::EmailTaken,
                other => AuthError::Database(other),
            })?;

        Ok(user_from_row(&row))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}

/// In-process implementation for tests and throwaway `--memory` servers.
///
/// Ids start at 1 and are never reused. Data is lost when the value is
/// dropped.
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: BTreeMap<UserId, User>,
    last_id: UserId,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flip the active flag of a stored user.
    pub fn set_active(&self, user_id: UserId, is_active: bool) -> AuthResult<()> {
        let mut inner = self.lock();
        let user = inner.users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.is_active = is_active;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn email_exists(&self, email: &str) -> AuthResult<bool> {
        Ok(self.lock().users.values().any(|u| u.email == email))
    }

    async fn create_user(&self, new_user: NewUser) -> AuthResult<User> {
        let mut inner = self.lock();

        let taken = inner
            .users
            .values()
            .any(|u| u.email == new_user.email || u.username == new_user.username);
        if taken {
            return Err(AuthError::EmailTaken);
        }

        inner.last_id += 1;
        let user = User {
            id: inner.last_id,
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            is_active: true,
            date_joined: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: email.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: "$argon2id$fake".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_create_user_assigns_sequential_ids() {
        let repo = MemoryUserRepository::new();

        let first = repo.create_user(new_user("a@x.com")).await.unwrap();
        let second = repo.create_user(new_user("b@x.com")).await.unwrap();

        assert_eq!(first.id, 1, "First user should have ID 1");
        assert_eq!(second.id, 2, "Second user should have ID 2");
        assert!(first.is_active);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_duplicate_email_rejected() {
        let repo = MemoryUserRepository::new();
        repo.create_user(new_user("a@x.com")).await.unwrap();

        let result = repo.create_user(new_user("a@x.com")).await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
        assert_eq!(repo.len(), 1, "No partial record should be written");
    }

    #[tokio::test]
    async fn test_memory_email_match_is_exact() {
        let repo = MemoryUserRepository::new();
        repo.create_user(new_user("a@x.com")).await.unwrap();

        assert!(repo.email_exists("a@x.com").await.unwrap());
        assert!(!repo.email_exists("A@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_lookups() {
        let repo = MemoryUserRepository::new();
        assert!(repo.find_by_username("a@x.com").await.unwrap().is_none());

        let created = repo.create_user(new_user("a@x.com")).await.unwrap();

        let by_name = repo.find_by_username("a@x.com").await.unwrap().unwrap();
        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_name, created);
        assert_eq!(by_id, created);
        assert!(repo.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_set_active() {
        let repo = MemoryUserRepository::new();
        let user = repo.create_user(new_user("a@x.com")).await.unwrap();

        repo.set_active(user.id, false).unwrap();
        assert!(!repo.find_by_id(user.id).await.unwrap().unwrap().is_active);
        assert!(matches!(repo.set_active(99, false), Err(AuthError::UserNotFound)));
    }
}
