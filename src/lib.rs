//! freegate - OpenAI-compatible gateway in front of a g4f upstream.
//!
//! Features:
//! - Per-model provider sequences with sequential fallback
//! - OpenAI-compatible chat completions API
//! - SQLite-backed client API keys with admin endpoints
//! - Terminal request logging with configurable verbosity

pub mod api;
pub mod backend;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod directory;
pub mod error;
pub mod g4f;
pub mod http;
pub mod keys;
pub mod logger;
pub mod router;
