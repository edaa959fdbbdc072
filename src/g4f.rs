//! HTTP completion backend for g4f-style interference APIs.
//!
//! Speaks the OpenAI chat-completions wire format. A pinned provider is sent
//! as the extra `provider` field; `auto` omits it so the upstream chooses.

use crate::backend::{
    AttemptFailure, CompletionBackend, CompletionRequest, UpstreamChoice, UpstreamCompletion,
    UpstreamMessage, Usage,
};
use crate::http::create_client_with_timeout;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

/// Longest upstream body excerpt quoted in an error message.
const ERROR_EXCERPT_CHARS: usize = 300;

/// Client for an OpenAI-compatible g4f endpoint.
#[derive(Clone)]
pub struct G4fClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl G4fClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:1337/v1";

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        })
    }

    /// Send `Authorization: Bearer <key>` with every attempt.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionBackend for G4fClient {
    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<UpstreamCompletion, AttemptFailure> {
        let mut req = self
            .client
            .post(self.completions_url())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request_body(request));

        if let Some(key) = &self.api_key {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = req.send().await?;
        let status = response.status();
        let is_event_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/event-stream"));
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AttemptFailure::new(format!(
                "upstream returned {}: {}",
                status,
                excerpt(&text)
            )));
        }

        if is_event_stream || text.trim_start().starts_with("data:") {
            accumulate_event_stream(&text)
        } else {
            parse_completion(&text)
        }
    }
}

/// JSON body for one attempt.
pub(crate) fn request_body(request: &CompletionRequest<'_>) -> Value {
    let mut body = serde_json::json!({
        "model": request.model,
        "messages": request.messages,
        "stream": request.stream,
    });

    if let Some(provider) = request.provider.filter(|p| !p.is_auto()) {
        body["provider"] = Value::String(provider.to_string());
    }

    body
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > ERROR_EXCERPT_CHARS {
        let cut: String = trimmed.chars().take(ERROR_EXCERPT_CHARS).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

/// Message of an `{"error": ...}` body, which some upstreams send with 200.
fn upstream_error_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    if error.is_null() {
        return None;
    }
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

/// Parse a non-streaming completion body.
///
/// Any JSON body other than an error body is the provider's answer. Fields
/// with unexpected types are dropped rather than failing the attempt, so a
/// body without usable content surfaces as a missing first choice.
fn parse_completion(text: &str) -> Result<UpstreamCompletion, AttemptFailure> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        AttemptFailure::new(format!("invalid JSON from upstream: {} | {}", e, excerpt(text)))
    })?;

    if let Some(message) = upstream_error_message(&value) {
        return Err(AttemptFailure::new(message));
    }

    let choices = value["choices"]
        .as_array()
        .map(|choices| choices.iter().map(lenient_choice).collect())
        .unwrap_or_default();

    Ok(UpstreamCompletion {
        id: value["id"].as_str().map(str::to_string),
        model: value["model"].as_str().map(str::to_string),
        choices,
        usage: lenient_usage(&value["usage"]),
    })
}

fn lenient_choice(choice: &Value) -> UpstreamChoice {
    let message = &choice["message"];
    UpstreamChoice {
        message: message.is_object().then(|| UpstreamMessage {
            role: message["role"].as_str().map(str::to_string),
            content: message["content"].as_str().map(str::to_string),
        }),
        finish_reason: choice["finish_reason"].as_str().map(str::to_string),
    }
}

/// Token usage, or `None` when absent or not shaped as expected.
fn lenient_usage(usage: &Value) -> Option<Usage> {
    if usage.is_null() {
        return None;
    }
    serde_json::from_value(usage.clone()).ok()
}

/// Fold a server-sent event stream of completion chunks into one completion.
pub(crate) fn accumulate_event_stream(text: &str) -> Result<UpstreamCompletion, AttemptFailure> {
    let mut completion = UpstreamCompletion::default();
    let mut content: Option<String> = None;
    let mut finish_reason = None;
    let mut chunks = 0usize;

    for line in text.lines() {
        let Some(data) = line.trim().strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() {
            continue;
        }
        if data == "[DONE]" {
            break;
        }

        let chunk: Value = serde_json::from_str(data)
            .map_err(|e| AttemptFailure::new(format!("invalid stream chunk: {} | {}", e, excerpt(data))))?;

        if let Some(message) = upstream_error_message(&chunk) {
            return Err(AttemptFailure::new(message));
        }

        chunks += 1;
        if completion.id.is_none() {
            completion.id = chunk["id"].as_str().map(str::to_string);
        }
        if completion.model.is_none() {
            completion.model = chunk["model"].as_str().map(str::to_string);
        }
        if let Some(usage) = lenient_usage(&chunk["usage"]) {
            completion.usage = Some(usage);
        }

        let choice = &chunk["choices"][0];
        if let Some(delta) = choice["delta"]["content"]
            .as_str()
            .or_else(|| choice["message"]["content"].as_str())
        {
            content.get_or_insert_with(String::new).push_str(delta);
        }
        if let Some(reason) = choice["finish_reason"].as_str() {
            finish_reason = Some(reason.to_string());
        }
    }

    if chunks == 0 {
        return Err(AttemptFailure::new("upstream event stream contained no chunks"));
    }

    completion.choices = vec![UpstreamChoice {
        message: Some(UpstreamMessage {
            role: Some("assistant".to_string()),
            content,
        }),
        finish_reason,
    }];

    Ok(completion)
}
