//! Request and response types for the gateway API.

use crate::backend::Usage;
use crate::catalog::{ModelDescriptor, ProviderDescriptor};
use crate::chat::ChatMessage;
use crate::keys::ApiKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
}

/// `{"success": true, "data": ...}`
#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Serialize)]
pub struct ChatData {
    pub content: String,
    pub model: String,
    pub finish_reason: Option<String>,
    pub messages_count: usize,
    pub provider: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Serialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Serialize)]
pub struct AssistantMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Serialize)]
pub struct Endpoints {
    pub chat: &'static str,
    pub models: &'static str,
    pub providers: &'static str,
    pub test: &'static str,
    pub health: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Serialize)]
pub struct ModelsData {
    pub models: &'static [ModelDescriptor],
    pub default_model: &'static str,
    pub total: usize,
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub object: &'static str,
    pub data: Vec<ModelInfo>,
}

#[derive(Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub object: &'static str,
    pub created: i64,
    pub owned_by: &'static str,
}

pub type ProvidersData = &'static [ProviderDescriptor];

#[derive(Serialize)]
pub struct TestData {
    pub message: String,
    pub model: String,
    pub status: &'static str,
    pub provider: String,
}

#[derive(Serialize)]
pub struct ApiKeysData {
    pub api_keys: Vec<ApiKey>,
}

#[derive(Serialize)]
pub struct GeneratedKeyData {
    pub api_key: String,
    pub remark: Option<String>,
}

#[derive(Serialize)]
pub struct MessageData {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateKeyQuery {
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}
