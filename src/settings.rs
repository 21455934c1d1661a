//! Service Settings
//!
//! Runtime configuration loaded from environment variables (with `.env`
//! support in local development). Every setting has a sane default except
//! the OpenRouter API key, which is validated lazily at call time so the
//! service can boot (and serve detail queries) without one.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::utils::error::{AppError, AppResult};

/// Default chat-completion endpoint (OpenRouter)
const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model identifier
const DEFAULT_LLM_MODEL: &str = "google/gemini-2.0-flash-001";

/// Default bind address for the HTTP layer
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Default on-disk database path
const DEFAULT_DATABASE_PATH: &str = "obra_audit.db";

/// Runtime settings for the service
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Address the warp server binds to
    pub bind_addr: SocketAddr,
    /// OpenRouter API key, if configured
    pub openrouter_api_key: Option<String>,
    /// Chat-completion endpoint URL
    pub llm_base_url: String,
    /// Model identifier sent with every invocation
    pub llm_model: String,
    /// Optional webhook URL notified after each terminal state
    pub webhook_url: Option<String>,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> AppResult<Self> {
        let bind_raw = env_or("OBRA_AUDIT_BIND", DEFAULT_BIND_ADDR);
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .map_err(|e| AppError::config(format!("invalid bind address '{}': {}", bind_raw, e)))?;

        Ok(Self {
            database_path: PathBuf::from(env_or("OBRA_AUDIT_DB", DEFAULT_DATABASE_PATH)),
            bind_addr,
            openrouter_api_key: env_opt("OPENROUTER_API_KEY"),
            llm_base_url: env_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            webhook_url: env_opt("WEBHOOK_URL"),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("default bind address is valid"),
            openrouter_api_key: None,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            webhook_url: None,
        }
    }
}

/// Read an environment variable, falling back to a default
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional environment variable, treating empty values as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
