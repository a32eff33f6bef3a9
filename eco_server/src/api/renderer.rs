//! Uniform `{success, message, data}` envelope for JSON responses.
//!
//! Routes opt in by attaching a [`ResponseFormat`] in the routing table; the
//! [`render_envelope`] middleware then rewrites whatever JSON the handler (or
//! an extractor rejection, or an inner middleware) produced:
//!
//! ```json
//! {"success": true, "message": "Login successful", "tokens": {"access": "...", "refresh": "..."}}
//! ```
//!
//! Routes without a format are never touched, so their bodies are exactly
//! what plain JSON rendering yields.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Configuration keys that select messages and data keys. They are never
/// copied into the envelope as extra fields.
pub const RESERVED_KEYS: [&str; 4] = [
    "success_message",
    "error_message",
    "success_data_key",
    "error_data_key",
];

/// Key the payload goes under when no data key is configured
pub const DEFAULT_DATA_KEY: &str = "data";

/// Per-endpoint envelope configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFormat {
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub success_data_key: Option<String>,
    pub error_data_key: Option<String>,
    /// Copied verbatim into every envelope, after `success` and `message`.
    pub extra: Map<String, Value>,
}

impl ResponseFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn success_data_key(mut self, key: impl Into<String>) -> Self {
        self.success_data_key = Some(key.into());
        self
    }

    pub fn error_data_key(mut self, key: impl Into<String>) -> Self {
        self.error_data_key = Some(key.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Wrap `data` for a response with the given `status`.
    pub fn envelope(&self, data: Value, status: StatusCode) -> Value {
        let success = status.is_success();

        let message = if success {
            &self.success_message
        } else {
            &self.error_message
        };
        let data_key = if success {
            &self.success_data_key
        } else {
            &self.error_data_key
        };

        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(success));
        body.insert(
            "message".to_string(),
            Value::String(message.clone().unwrap_or_default()),
        );

        for (key, value) in &self.extra {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            body.insert(key.clone(), value.clone());
        }

        body.insert(
            data_key.as_deref().unwrap_or(DEFAULT_DATA_KEY).to_string(),
            data,
        );

        Value::Object(body)
    }
}

/// What the renderer knows about the response being rendered.
#[derive(Debug, Clone, Copy)]
pub struct RendererContext<'a> {
    pub status: StatusCode,
    pub response_format: Option<&'a ResponseFormat>,
}

/// Serialize `data`, wrapping it when the context carries a format.
///
/// Without a context, or without a format, the output is plain
/// `serde_json::to_vec(data)`.
pub fn render(data: &Value, context: Option<&RendererContext<'_>>) -> serde_json::Result<Vec<u8>> {
    match context {
        Some(RendererContext {
            status,
            response_format: Some(format),
        }) => serde_json::to_vec(&format.envelope(data.clone(), *status)),
        _ => serde_json::to_vec(data),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            let mime = value.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
}

/// Middleware applying `format` to the wrapped route's responses.
///
/// Bodies that are not JSON pass through untouched; an empty body is
/// rendered as `null` payload.
pub async fn render_envelope(
    State(format): State<Arc<ResponseFormat>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let (mut parts, body) = response.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to buffer response body for rendering");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let payload = if bytes.is_empty() {
        Value::Null
    } else if is_json(&parts.headers) {
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(_) => return Response::from_parts(parts, Body::from(bytes)),
        }
    } else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    let context = RendererContext {
        status: parts.status,
        response_format: Some(format.as_ref()),
    };

    match render(&payload, Some(&context)) {
        Ok(rendered) => {
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(rendered.len()));
            Response::from_parts(parts, Body::from(rendered))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to render response envelope");
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}
