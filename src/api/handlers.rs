//! HTTP handlers for the gateway API.

use super::auth::{Admin, ClientKey};
use super::types::*;
use super::AppState;
use crate::catalog::{DEFAULT_MODEL, MODELS, PROVIDERS};
use crate::chat::ChatMessage;
use crate::config::ResponseFormat;
use crate::error::GatewayError;
use crate::logger::{log_route, RouteLog};
use crate::router::Completion;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::Uri,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

const TEST_PROMPT: &str = "Say 'Hello, World!' in exactly those words.";

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "freegate: OpenAI-compatible gateway with provider fallback",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            chat: "/v1/chat/completions",
            models: "/v1/models",
            providers: "/v1/providers",
            test: "/v1/test",
            health: "/health",
        },
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "freegate",
    })
}

pub async fn not_found(uri: Uri) -> GatewayError {
    GatewayError::NotFound(format!("No route for {}", uri.path()))
}

/// Route through the fallback router and print the terminal summary.
async fn route_logged(
    state: &AppState,
    method: &str,
    path: &str,
    model: &str,
    messages: &[ChatMessage],
    stream: bool,
) -> Result<Completion, GatewayError> {
    let started = Instant::now();
    let result = state.router.route(model, messages, stream).await;

    let log = RouteLog {
        method,
        path,
        model,
        total_ms: started.elapsed().as_millis() as u64,
        outcome: result.as_ref(),
    };
    if let Err(e) = log_route(&mut std::io::stdout(), &log, &state.log_verbosity) {
        tracing::debug!(error = %e, "Failed to write request log");
    }

    result
}

pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    _key: ClientKey,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidInput(e.body_text()))?;

    let model = request
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let stream = request.stream.unwrap_or(false);

    tracing::info!(
        model = %model,
        messages = request.messages.len(),
        stream,
        "Chat completion request"
    );

    let completion = route_logged(
        &state,
        "POST",
        "/v1/chat/completions",
        &model,
        &request.messages,
        stream,
    )
    .await?;

    let response = match state.response_format {
        ResponseFormat::Envelope => Json(Envelope::ok(ChatData {
            content: completion.content,
            model: completion.model,
            finish_reason: completion.finish_reason,
            messages_count: request.messages.len(),
            provider: completion.provider.to_string(),
        }))
        .into_response(),
        ResponseFormat::Openai => Json(openai_response(completion)).into_response(),
    };

    Ok(response)
}

fn openai_response(completion: Completion) -> ChatResponse {
    ChatResponse {
        id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
        object: "chat.completion",
        created: chrono::Utc::now().timestamp(),
        model: completion.model,
        choices: vec![ChatChoice {
            index: 0,
            message: AssistantMessage {
                role: "assistant",
                content: completion.content,
            },
            finish_reason: completion.finish_reason,
        }],
        usage: completion.usage,
    }
}

pub async fn list_models(State(state): State<Arc<AppState>>, _key: ClientKey) -> Response {
    match state.response_format {
        ResponseFormat::Envelope => Json(Envelope::ok(ModelsData {
            models: MODELS,
            default_model: DEFAULT_MODEL,
            total: MODELS.len(),
        }))
        .into_response(),
        ResponseFormat::Openai => {
            let created = chrono::Utc::now().timestamp();
            let data = MODELS
                .iter()
                .map(|m| ModelInfo {
                    id: m.id,
                    object: "model",
                    created,
                    owned_by: m.provider,
                })
                .collect();
            Json(ModelsResponse {
                object: "list",
                data,
            })
            .into_response()
        }
    }
}

pub async fn list_providers(_key: ClientKey) -> Json<Envelope<ProvidersData>> {
    Json(Envelope::ok(PROVIDERS))
}

pub async fn test_completion(
    State(state): State<Arc<AppState>>,
    _key: ClientKey,
) -> Result<Json<Envelope<TestData>>, GatewayError> {
    let messages = [ChatMessage::user(TEST_PROMPT)];
    let completion = route_logged(&state, "GET", "/v1/test", DEFAULT_MODEL, &messages, false).await?;

    Ok(Json(Envelope::ok(TestData {
        message: completion.content,
        model: completion.model,
        status: "working",
        provider: completion.provider.to_string(),
    })))
}

pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
) -> Result<Json<Envelope<ApiKeysData>>, GatewayError> {
    let api_keys = state.lock_keys()?.list()?;
    Ok(Json(Envelope::ok(ApiKeysData { api_keys })))
}

pub async fn generate_api_key(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Query(query): Query<GenerateKeyQuery>,
) -> Result<Json<Envelope<GeneratedKeyData>>, GatewayError> {
    let remark = query.remark.filter(|r| !r.trim().is_empty());
    let key = state.lock_keys()?.generate(remark.as_deref())?;

    tracing::info!(remark = ?key.remark, "Generated API key");

    Ok(Json(Envelope::ok(GeneratedKeyData {
        api_key: key.key,
        remark: key.remark,
    })))
}

pub async fn revoke_api_key(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(key): Path<String>,
) -> Result<Json<Envelope<MessageData>>, GatewayError> {
    if !state.lock_keys()?.revoke(&key)? {
        return Err(GatewayError::NotFound("API key not found".to_string()));
    }

    tracing::info!("Revoked API key");

    Ok(Json(Envelope::ok(MessageData {
        message: "API key revoked".to_string(),
    })))
}

pub async fn set_api_key_active(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(key): Path<String>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<Envelope<MessageData>>, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidInput(e.body_text()))?;

    if !state.lock_keys()?.set_active(&key, request.active)? {
        return Err(GatewayError::NotFound("API key not found".to_string()));
    }

    let message = if request.active {
        "API key enabled"
    } else {
        "API key disabled"
    };

    Ok(Json(Envelope::ok(MessageData {
        message: message.to_string(),
    })))
}
