//! Completion backend abstraction.
//!
//! A backend performs one chat-completion attempt, either against a pinned
//! provider or letting the backend pick one. The router only ever sees the
//! `Result` of an attempt.

use crate::chat::ChatMessage;
use crate::directory::ProviderId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters of a single completion attempt.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    /// `None` lets the backend choose the provider.
    pub provider: Option<&'a ProviderId>,
    pub stream: bool,
}

/// OpenAI-style completion body returned by the upstream.
///
/// Every field is optional on the wire; the router decides whether the
/// payload is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpstreamCompletion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<UpstreamChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpstreamChoice {
    #[serde(default)]
    pub message: Option<UpstreamMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpstreamMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Token accounting, when the upstream reports it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl UpstreamCompletion {
    /// Single-choice completion with assistant content.
    pub fn from_content(content: impl Into<String>, finish_reason: Option<&str>) -> Self {
        Self {
            choices: vec![UpstreamChoice {
                message: Some(UpstreamMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                }),
                finish_reason: finish_reason.map(str::to_string),
            }],
            ..Self::default()
        }
    }

    /// Content and finish reason of the first choice, if present.
    pub fn first_choice(&self) -> Option<(&str, Option<&str>)> {
        let choice = self.choices.first()?;
        let content = choice.message.as_ref()?.content.as_deref()?;
        Some((content, choice.finish_reason.as_deref()))
    }
}

/// Failure of a single attempt. Only ever reported as "last error".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub message: String,
}

impl AttemptFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AttemptFailure {}

impl From<reqwest::Error> for AttemptFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::new(format!("request timed out: {}", e))
        } else if e.is_connect() {
            Self::new(format!("connection failed: {}", e))
        } else {
            Self::new(format!("request failed: {}", e))
        }
    }
}

/// Something that can attempt a chat completion.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<UpstreamCompletion, AttemptFailure>;
}
