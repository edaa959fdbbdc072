//! Static model and provider descriptors served by the listing endpoints.

use serde::Serialize;

/// Model used when a chat request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub status: &'static str,
    pub models: &'static [&'static str],
    pub description: &'static str,
}

pub const MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        id: "gpt-4",
        name: "GPT-4",
        provider: "auto",
        description: "OpenAI's flagship language model",
    },
    ModelDescriptor {
        id: "gpt-4o",
        name: "GPT-4o",
        provider: "auto",
        description: "Optimized GPT-4",
    },
    ModelDescriptor {
        id: "gpt-3.5-turbo",
        name: "GPT-3.5 Turbo",
        provider: "auto",
        description: "Fast and efficient model",
    },
    ModelDescriptor {
        id: "claude-sonnet-4.5",
        name: "Claude Sonnet 4.5",
        provider: "auto (with fallback)",
        description: "Anthropic Claude Sonnet 4.5 via keyless providers",
    },
    ModelDescriptor {
        id: "claude-sonnet-4",
        name: "Claude Sonnet 4",
        provider: "auto (with fallback)",
        description: "Anthropic Claude Sonnet 4 via keyless providers",
    },
    ModelDescriptor {
        id: "claude-haiku-4.5",
        name: "Claude Haiku 4.5",
        provider: "auto (with fallback)",
        description: "Anthropic Claude Haiku 4.5, fast and keyless",
    },
    ModelDescriptor {
        id: "gemini-2.5-flash",
        name: "Gemini 2.5 Flash",
        provider: "auto",
        description: "Google Gemini 2.5 Flash",
    },
    ModelDescriptor {
        id: "gemini-2.5-pro",
        name: "Gemini 2.5 Pro",
        provider: "auto",
        description: "Google Gemini 2.5 Pro",
    },
    ModelDescriptor {
        id: "deepseek-v3",
        name: "DeepSeek V3",
        provider: "auto",
        description: "DeepSeek V3",
    },
    ModelDescriptor {
        id: "deepseek-r1",
        name: "DeepSeek R1",
        provider: "auto",
        description: "DeepSeek R1 Reasoning",
    },
    ModelDescriptor {
        id: "llama-4-scout",
        name: "Llama 4 Scout",
        provider: "auto",
        description: "Meta Llama 4 Scout",
    },
];

pub const PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        name: "api.airforce",
        status: "active",
        models: &["gpt-4o-mini", "claude-sonnet-4", "gemini-2.5-flash"],
        description: "Airforce API provider",
    },
    ProviderDescriptor {
        name: "deep-infra",
        status: "active",
        models: &["meta-llama", "mistral", "qwen"],
        description: "DeepInfra provider",
    },
    ProviderDescriptor {
        name: "gemini",
        status: "active",
        models: &["gemini-2.5-flash", "gemini-2.5-pro"],
        description: "Google Gemini provider",
    },
    ProviderDescriptor {
        name: "groq",
        status: "active",
        models: &["llama-3.3", "mixtral"],
        description: "Groq provider",
    },
];
