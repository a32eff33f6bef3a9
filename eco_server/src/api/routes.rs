//! Static routing table for the authentication endpoints.
//!
//! Each entry names the method, the full path, the handler and the envelope
//! format the renderer applies to it. [`super::create_router`] mounts the
//! table as-is.

use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::{MethodRouter, get, post},
};
use std::{fmt, str::FromStr};

use super::{AppState, auth, middleware::auth_middleware, renderer::ResponseFormat};

/// Which authentication endpoints are mounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoutingVariant {
    /// `/v1/auth/register/`, `/v1/auth/login/`, token refresh and current user
    #[default]
    Standard,
    /// Registration only, served at `/v1/auth/`
    RegisterOnly,
}

impl FromStr for RoutingVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(RoutingVariant::Standard),
            "register-only" | "register_only" => Ok(RoutingVariant::RegisterOnly),
            other => Err(format!(
                "unknown routing variant '{other}' (expected 'standard' or 'register-only')"
            )),
        }
    }
}

impl fmt::Display for RoutingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingVariant::Standard => write!(f, "standard"),
            RoutingVariant::RegisterOnly => write!(f, "register-only"),
        }
    }
}

/// One row of the routing table
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    pub handler: MethodRouter<AppState>,
    pub response_format: Option<ResponseFormat>,
}

/// Build the authentication routing table for `variant`.
pub fn auth_routes(state: &AppState, variant: RoutingVariant) -> Vec<Route> {
    match variant {
        RoutingVariant::RegisterOnly => vec![Route {
            method: Method::POST,
            path: "/v1/auth/",
            handler: post(auth::register),
            response_format: Some(auth::register_response_format()),
        }],
        RoutingVariant::Standard => vec![
            Route {
                method: Method::POST,
                path: "/v1/auth/register/",
                handler: post(auth::register),
                response_format: Some(auth::register_response_format()),
            },
            Route {
                method: Method::POST,
                path: "/v1/auth/login/",
                handler: post(auth::login),
                response_format: Some(auth::login_response_format()),
            },
            Route {
                method: Method::POST,
                path: "/v1/auth/token/refresh/",
                handler: post(auth::refresh_token),
                response_format: Some(auth::refresh_response_format()),
            },
            Route {
                method: Method::GET,
                path: "/v1/auth/me/",
                handler: get(auth::me)
                    .route_layer(from_fn_with_state(state.clone(), auth_middleware)),
                response_format: Some(auth::profile_response_format()),
            },
        ],
    }
}
