//! HTTP error responses.
//!
//! Every failure leaves the server as JSON. Routes with a response format get
//! these bodies wrapped by the renderer under their error data key.

use axum::{
    Json,
    http::{
        HeaderValue, Method, StatusCode,
        header::{ALLOW, WWW_AUTHENTICATE},
    },
    response::{IntoResponse, Response},
};
use eco_tech::auth::{AuthError, ValidationError, validation};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by API handlers, extractors and middleware
#[derive(Debug, Error)]
pub enum ApiError {
    /// Field-level input errors (400)
    #[error(transparent)]
    Validation(ValidationError),

    /// Credentials or account rejected (401)
    #[error("{0}")]
    Authentication(String),

    /// Bearer or refresh token rejected (401)
    #[error("Token is invalid or expired")]
    InvalidToken,

    /// No bearer token on a protected route (401)
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    /// Unparsable request body (400)
    #[error("{0}")]
    BadRequest(String),

    /// Path exists but not for this method (405)
    #[error("Method \"{method}\" not allowed.")]
    MethodNotAllowed { method: Method, allowed: Method },

    /// Request body is not JSON (415)
    #[error("Unsupported media type \"{0}\" in request.")]
    UnsupportedMediaType(String),

    /// Anything the caller cannot fix (500); the cause is logged only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) | ApiError::InvalidToken | ApiError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_internal() {
            return ApiError::Internal(err.to_string());
        }

        match err {
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::EmailTaken => {
                ApiError::Validation(ValidationError::field("email", validation::NOT_UNIQUE))
            }
            AuthError::InvalidToken => ApiError::InvalidToken,
            _ => ApiError::Authentication(err.client_message()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::InvalidToken => json!({
                "detail": self.to_string(),
                "code": "token_not_valid",
            }),
            ApiError::Internal(cause) => {
                tracing::error!(error = %cause, "Request failed with internal error");
                json!({ "detail": "A server error occurred." })
            }
            _ => json!({ "detail": self.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"api\""));
        }
        if let ApiError::MethodNotAllowed { allowed, .. } = &self {
            if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
                response.headers_mut().insert(ALLOW, value);
            }
        }
        response
    }
}
