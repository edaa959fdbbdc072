//! Request authentication.
//!
//! Client routes take a key from `X-API-Key` or `Authorization: Bearer`.
//! Admin routes take the configured admin key from `X-Admin-Key`.

use super::AppState;
use crate::error::GatewayError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::sync::Arc;

const API_KEY_HEADER: &str = "x-api-key";
const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// A verified client key. Verification also counts the request.
#[derive(Debug, Clone)]
pub struct ClientKey(pub String);

/// Marker for a request carrying the admin key.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client key from `X-API-Key`, falling back to a bearer token.
pub fn client_key_from_headers(headers: &HeaderMap) -> Option<&str> {
    header_value(headers, API_KEY_HEADER).or_else(|| {
        header_value(headers, header::AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

impl FromRequestParts<Arc<AppState>> for ClientKey {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let key = client_key_from_headers(&parts.headers)
            .ok_or_else(|| GatewayError::Unauthorized("No API key provided".to_string()))?
            .to_string();

        let valid = state.lock_keys()?.verify(&key)?;
        if !valid {
            tracing::warn!("Rejected request with invalid API key");
            return Err(GatewayError::Forbidden("Invalid API key".to_string()));
        }

        Ok(Self(key))
    }
}

impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let provided = header_value(&parts.headers, ADMIN_KEY_HEADER)
            .ok_or_else(|| GatewayError::Unauthorized("No admin key provided".to_string()))?;

        match state.admin_key.as_deref() {
            Some(expected) if expected == provided => Ok(Admin),
            _ => {
                tracing::warn!("Rejected request with invalid admin key");
                Err(GatewayError::Forbidden("Invalid admin key".to_string()))
            }
        }
    }
}
