//! Authentication API handlers.
//!
//! This module provides HTTP REST endpoints for user authentication including:
//! - User registration with email, password and optional names
//! - Login with email/password, returning an access/refresh token pair
//! - Access token refresh
//! - Fetching the user behind a bearer token
//!
//! Each handler returns its raw result; the envelope is added by the renderer
//! according to the endpoint's [`ResponseFormat`].
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:8000/v1/auth/register/ \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@x.com", "password": "p1", "first_name": "A", "last_name": "X"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8000/v1/auth/login/ \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@x.com", "password": "p1"}'
//! ```

use axum::{Extension, Json, extract::State, http::StatusCode};
use eco_tech::auth::{AccessToken, TokenPair, UserId, UserRepresentation};

use super::{AppState, error::ApiError, extract::JsonBody, renderer::ResponseFormat};
use crate::{logging, metrics};

/// Envelope settings for the registration endpoint
pub fn register_response_format() -> ResponseFormat {
    ResponseFormat::new()
        .success_message("Account created successfully. Please login to continue")
        .error_message("Account creation failed")
        .success_data_key("user")
        .error_data_key("error")
}

/// Envelope settings for the login endpoint
pub fn login_response_format() -> ResponseFormat {
    ResponseFormat::new()
        .success_message("Login successful")
        .error_message("Login failed. Please try again")
        .success_data_key("tokens")
        .error_data_key("error")
}

/// Envelope settings for the token refresh endpoint
pub fn refresh_response_format() -> ResponseFormat {
    ResponseFormat::new()
        .success_message("Token refreshed")
        .error_message("Token refresh failed")
        .success_data_key("tokens")
        .error_data_key("error")
}

/// Envelope settings for the current-user endpoint
pub fn profile_response_format() -> ResponseFormat {
    ResponseFormat::new()
        .success_message("User details fetched")
        .error_message("Could not fetch user details")
        .success_data_key("user")
        .error_data_key("error")
}

/// Register a new user account.
///
/// # Request Body
///
/// ```json
/// {
///   "email": "a@x.com",
///   "password": "p1",
///   "first_name": "A",  // Optional
///   "last_name": "X"    // Optional
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the new user, password omitted:
/// ```json
/// {"id": 1, "email": "a@x.com", "first_name": "A", "last_name": "X"}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing, blank, malformed or already registered email;
///   missing or blank password
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody,
) -> Result<(StatusCode, Json<UserRepresentation>), ApiError> {
    match state.auth_manager.register(&payload).await {
        Ok(user) => {
            metrics::registrations_total("created");
            Ok((StatusCode::CREATED, Json(UserRepresentation::from(&user))))
        }
        Err(e) => {
            metrics::registrations_total("rejected");
            Err(e.into())
        }
    }
}

/// Authenticate by email and password and issue a token pair.
///
/// # Request Body
///
/// ```json
/// {"email": "a@x.com", "password": "p1"}
/// ```
///
/// # Response
///
/// `200 OK` with tokens:
/// ```json
/// {"access": "eyJhbGciOiJIUzI1NiIs...", "refresh": "eyJhbGciOiJIUzI1NiIs..."}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing or blank field
/// - `401 Unauthorized`: unknown email, wrong password or inactive account
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody,
) -> Result<Json<TokenPair>, ApiError> {
    match state.auth_manager.login(&payload).await {
        Ok(tokens) => {
            metrics::login_attempts_total("success");
            Ok(Json(tokens))
        }
        Err(e) => {
            metrics::login_attempts_total("failure");
            let email = payload.get("email").and_then(|v| v.as_str());
            logging::log_security_event("failed_login", email, &e.to_string());
            Err(e.into())
        }
    }
}

/// Mint a new access token from a refresh token.
///
/// # Request Body
///
/// ```json
/// {"refresh": "eyJhbGciOiJIUzI1NiIs..."}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing `refresh` field
/// - `401 Unauthorized`: invalid, expired, or access token passed as refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody,
) -> Result<Json<AccessToken>, ApiError> {
    let token = state.auth_manager.refresh(&payload).await?;
    Ok(Json(token))
}

/// Return the user the bearer token belongs to.
///
/// Mounted behind [`super::middleware::auth_middleware`], which supplies the
/// user ID.
pub async fn me(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<UserRepresentation>, ApiError> {
    let user = state.auth_manager.current_user(user_id).await?;
    Ok(Json(UserRepresentation::from(&user)))
}
