//! OpenAI-compatible gateway API.
//!
//! Endpoints:
//! - GET / - Service banner
//! - GET /health - Health check
//! - POST /v1/chat/completions - Routed chat completion
//! - GET /v1/models - Model catalog
//! - GET /v1/providers - Provider catalog
//! - GET /v1/test - Routed smoke test
//! - GET /v1/admin/api_keys - List API keys
//! - POST /v1/admin/generate_api_key - Create an API key
//! - DELETE /v1/admin/revoke_api_key/:key - Delete an API key
//! - PATCH /v1/admin/api_keys/:key - Enable or disable an API key

mod auth;
mod handlers;
#[cfg(test)]
mod tests;
mod types;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, LogVerbosity, ResponseFormat};
use crate::error::GatewayError;
use crate::g4f::G4fClient;
use crate::keys::ApiKeyStore;
use crate::router::FallbackRouter;

pub use auth::{client_key_from_headers, Admin, ClientKey};
pub use types::*;

/// Application state shared across handlers.
pub struct AppState {
    pub router: FallbackRouter,
    pub keys: Mutex<ApiKeyStore>,
    pub admin_key: Option<String>,
    pub response_format: ResponseFormat,
    pub log_verbosity: LogVerbosity,
}

impl AppState {
    pub fn new(router: FallbackRouter, keys: ApiKeyStore) -> Self {
        Self {
            router,
            keys: Mutex::new(keys),
            admin_key: None,
            response_format: ResponseFormat::default(),
            log_verbosity: LogVerbosity::default(),
        }
    }

    pub fn with_admin_key(mut self, admin_key: Option<String>) -> Self {
        self.admin_key = admin_key;
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_log_verbosity(mut self, verbosity: LogVerbosity) -> Self {
        self.log_verbosity = verbosity;
        self
    }

    /// Build the state a server runs with: g4f backend, configured
    /// directory, and the key database on disk.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let directory = config
            .provider_directory()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        let backend = G4fClient::new(&config.upstream.base_url, config.upstream_timeout())
            .map_err(|e| GatewayError::Config(format!("cannot build HTTP client: {}", e)))?
            .with_api_key(config.upstream.api_key.clone());
        let keys = ApiKeyStore::open(&config.auth.database)?;

        let router = FallbackRouter::new(Arc::new(directory), Arc::new(backend));

        Ok(Self::new(router, keys)
            .with_admin_key(config.auth.admin_key.clone())
            .with_response_format(config.gateway.response_format)
            .with_log_verbosity(config.app.log_verbosity.clone()))
    }

    /// Lock the key store. The guard must not be held across an await.
    pub fn lock_keys(&self) -> Result<MutexGuard<'_, ApiKeyStore>, GatewayError> {
        self.keys
            .lock()
            .map_err(|e| GatewayError::Storage(format!("Key store lock error: {}", e)))
    }
}

/// Create the API router with the given state.
pub fn create_router_with_state(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .route("/v1/models", get(handlers::list_models))
        .route("/v1/providers", get(handlers::list_providers))
        .route("/v1/test", get(handlers::test_completion))
        .route("/v1/admin/api_keys", get(handlers::list_api_keys))
        .route("/v1/admin/generate_api_key", post(handlers::generate_api_key))
        .route("/v1/admin/revoke_api_key/{key}", delete(handlers::revoke_api_key))
        .route("/v1/admin/api_keys/{key}", patch(handlers::set_api_key_active))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
