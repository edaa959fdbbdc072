//! Model-to-provider directory.
//!
//! Maps a logical model name to the ordered list of upstream providers that
//! should be tried for it. Built once at startup and shared read-only.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentinel provider name meaning "let the backend choose".
pub const AUTO_PROVIDER: &str = "auto";

const CLAUDE_PROVIDERS: &[&str] = &["You", "Puter", "Airforce", "PerplexityLabs", AUTO_PROVIDER];
const AUTO_THEN_AIRFORCE: &[&str] = &[AUTO_PROVIDER, "Airforce"];

/// Built-in table of models and their provider priority.
const BUILTIN_TABLE: &[(&str, &[&str])] = &[
    ("claude-sonnet-4.5", CLAUDE_PROVIDERS),
    ("claude-sonnet-4", CLAUDE_PROVIDERS),
    ("claude-haiku-4.5", CLAUDE_PROVIDERS),
    ("claude-3.5-sonnet", CLAUDE_PROVIDERS),
    ("claude-3-sonnet", CLAUDE_PROVIDERS),
    ("claude-3-haiku", CLAUDE_PROVIDERS),
    ("gpt-4", AUTO_THEN_AIRFORCE),
    ("gpt-4o", AUTO_THEN_AIRFORCE),
    ("gpt-4o-mini", AUTO_THEN_AIRFORCE),
    ("gpt-3.5-turbo", AUTO_THEN_AIRFORCE),
    ("gemini-2.5-flash", AUTO_THEN_AIRFORCE),
    ("gemini-2.5-pro", AUTO_THEN_AIRFORCE),
    ("deepseek-v3", AUTO_THEN_AIRFORCE),
    ("deepseek-r1", AUTO_THEN_AIRFORCE),
];

/// Name of an upstream provider, or the `auto` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn auto() -> Self {
        Self(AUTO_PROVIDER.to_string())
    }

    pub fn is_auto(&self) -> bool {
        self.0 == AUTO_PROVIDER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Ordered, non-empty list of providers. Index 0 has the highest priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSequence(Vec<ProviderId>);

impl ProviderSequence {
    /// Returns `None` for an empty list.
    pub fn new(providers: Vec<ProviderId>) -> Option<Self> {
        if providers.is_empty() {
            None
        } else {
            Some(Self(providers))
        }
    }

    /// The default sequence for unknown models: `["auto"]`.
    pub fn auto_only() -> Self {
        Self(vec![ProviderId::auto()])
    }

    fn from_names(names: &[&str]) -> Self {
        Self(names.iter().map(|n| ProviderId::new(*n)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProviderId> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ProviderSequence {
    type Item = &'a ProviderId;
    type IntoIter = std::slice::Iter<'a, ProviderId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Immutable model -> provider-sequence table.
#[derive(Debug, Clone)]
pub struct ProviderDirectory {
    entries: HashMap<String, ProviderSequence>,
    default: ProviderSequence,
}

impl ProviderDirectory {
    /// Directory with no entries; every lookup yields `["auto"]`.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            default: ProviderSequence::auto_only(),
        }
    }

    /// Directory populated from the built-in table.
    pub fn builtin() -> Self {
        let entries = BUILTIN_TABLE
            .iter()
            .map(|(model, providers)| (model.to_string(), ProviderSequence::from_names(providers)))
            .collect();

        Self {
            entries,
            default: ProviderSequence::auto_only(),
        }
    }

    /// Add or replace a single entry while building.
    pub fn with_entry(mut self, model: impl Into<String>, sequence: ProviderSequence) -> Self {
        self.entries.insert(model.into(), sequence);
        self
    }

    /// Apply `[models]` overrides from the config file.
    pub fn with_overrides(
        mut self,
        overrides: &HashMap<String, Vec<String>>,
    ) -> Result<Self, GatewayError> {
        for (model, providers) in overrides {
            let sequence = ProviderSequence::new(
                providers.iter().map(|p| ProviderId::new(p.as_str())).collect(),
            )
            .ok_or_else(|| {
                GatewayError::Config(format!("provider list for model '{}' is empty", model))
            })?;
            self.entries.insert(model.clone(), sequence);
        }
        Ok(self)
    }

    /// Resolve the provider sequence for a model, falling back to `["auto"]`.
    pub fn lookup(&self, model: &str) -> &ProviderSequence {
        self.entries.get(model).unwrap_or(&self.default)
    }

    /// Whether the model has its own entry.
    pub fn contains(&self, model: &str) -> bool {
        self.entries.contains_key(model)
    }
}

impl Default for ProviderDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}
