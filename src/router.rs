//! Fallback request router.
//!
//! For a model, tries each provider of its sequence in order, one at a time,
//! and returns the first successful completion. Any attempt failure moves on
//! to the next provider; when the sequence is exhausted the last failure is
//! reported. Every call starts again from the first provider.

use crate::backend::{CompletionBackend, CompletionRequest, UpstreamCompletion, Usage};
use crate::chat::ChatMessage;
use crate::directory::{ProviderDirectory, ProviderId};
use crate::error::GatewayError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one provider attempt, kept for logging.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttemptRecord {
    pub provider: ProviderId,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A routed completion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Completion {
    pub content: String,
    pub finish_reason: Option<String>,
    /// The model that was requested.
    pub model: String,
    /// The sequence entry that produced the completion.
    pub provider: ProviderId,
    pub usage: Option<Usage>,
    /// Attempts in order; the last one is the success.
    pub attempts: Vec<AttemptRecord>,
}

/// Reject requests that must never reach a provider.
pub fn validate_messages(messages: &[ChatMessage]) -> Result<(), GatewayError> {
    if messages.is_empty() {
        return Err(GatewayError::InvalidInput(
            "messages must contain at least one message".to_string(),
        ));
    }

    for message in messages {
        message.parsed_role().map_err(GatewayError::InvalidInput)?;
    }

    Ok(())
}

/// Routes chat requests across the providers configured for a model.
#[derive(Clone)]
pub struct FallbackRouter {
    directory: Arc<ProviderDirectory>,
    backend: Arc<dyn CompletionBackend>,
}

impl FallbackRouter {
    pub fn new(directory: Arc<ProviderDirectory>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { directory, backend }
    }

    /// Route one chat request.
    ///
    /// Fails with [`GatewayError::InvalidInput`] before any attempt, with
    /// [`GatewayError::AllProvidersExhausted`] when every provider failed, or
    /// with [`GatewayError::UpstreamUnexpected`] when the winning provider's
    /// answer has no usable content.
    pub async fn route(
        &self,
        model: &str,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<Completion, GatewayError> {
        validate_messages(messages)?;

        let sequence = self.directory.lookup(model);
        let mut attempts = Vec::with_capacity(sequence.len());
        let mut last_error = String::new();

        for provider in sequence {
            tracing::info!(model, provider = %provider, "Trying provider");

            let request = CompletionRequest {
                model,
                messages,
                provider: (!provider.is_auto()).then_some(provider),
                stream,
            };
            let started = Instant::now();
            let result = self.backend.complete(&request).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(upstream) => {
                    tracing::info!(model, provider = %provider, elapsed_ms, "Provider succeeded");
                    attempts.push(AttemptRecord {
                        provider: provider.clone(),
                        elapsed_ms,
                        error: None,
                    });
                    return build_completion(model, provider, upstream, attempts);
                }
                Err(failure) => {
                    tracing::warn!(
                        model,
                        provider = %provider,
                        elapsed_ms,
                        error = %failure,
                        "Provider failed"
                    );
                    attempts.push(AttemptRecord {
                        provider: provider.clone(),
                        elapsed_ms,
                        error: Some(failure.message.clone()),
                    });
                    last_error = failure.message;
                }
            }
        }

        tracing::error!(model, attempts = attempts.len(), last_error = %last_error, "All providers failed");

        Err(GatewayError::AllProvidersExhausted {
            model: model.to_string(),
            attempts: attempts.len(),
            last_error,
        })
    }
}

fn build_completion(
    model: &str,
    provider: &ProviderId,
    upstream: UpstreamCompletion,
    attempts: Vec<AttemptRecord>,
) -> Result<Completion, GatewayError> {
    let (content, finish_reason) = upstream.first_choice().ok_or_else(|| {
        GatewayError::UpstreamUnexpected(format!(
            "provider {} returned a completion without message content",
            provider
        ))
    })?;

    Ok(Completion {
        content: content.to_string(),
        finish_reason: finish_reason.map(str::to_string),
        model: model.to_string(),
        provider: provider.clone(),
        usage: upstream.usage,
        attempts,
    })
}
