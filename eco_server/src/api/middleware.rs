//! Authentication middleware for protected endpoints.
//!
//! Extracts and validates the JWT access token from the Authorization
//! header, then injects the authenticated user ID into request extensions
//! for downstream handlers.
//!
//! # Extracting User ID
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//!
//! async fn protected_handler(Extension(user_id): Extension<i64>) -> String {
//!     format!("Authenticated as user {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::{AppState, error::ApiError};

/// Authentication middleware that validates JWT tokens and injects user ID.
///
/// # Behavior
///
/// - **Success**: access token valid → injects `user_id: i64` → calls next handler
/// - **Missing header or non-Bearer scheme**: `401`, credentials not provided
/// - **Invalid/expired token, or a refresh token**: `401`, `token_not_valid`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::NotAuthenticated)?;

    let claims = state.auth_manager.verify_access_token(token)?;
    request.extensions_mut().insert(claims.user_id);

    Ok(next.run(request).await)
}
