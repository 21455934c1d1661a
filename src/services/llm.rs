//! Model Client
//!
//! Boundary to the external chat-completion endpoint. The client sends the
//! instruction pair with a JSON-output directive and returns the raw decoded
//! envelope untouched; interpreting its shape is the orchestrator's job.
//! The fixed request timeout is the pipeline's only cancellation mechanism.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::settings::Settings;
use crate::utils::error::AppError;

/// Fixed timeout for one chat-completion request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Referer sent to OpenRouter (required by their API)
const HTTP_REFERER: &str = "http://localhost:8000";

/// Model client error type
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Server error (HTTP {status}): {message}")]
    ServerError { message: String, status: u16 },

    #[error("Malformed response envelope: {message}")]
    MalformedEnvelope { message: String },

    #[error("{message}")]
    Other { message: String },
}

/// Result type alias for model client errors
pub type LlmResult<T> = Result<T, LlmError>;

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Model(err.to_string())
    }
}

/// Map an HTTP error status to a typed client error
pub fn parse_http_error(status: u16, body: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed {
            message: body.to_string(),
        },
        400 | 404 | 422 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status,
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

/// Common interface for model clients.
///
/// The orchestrator depends on this trait so tests can script responses
/// without a network.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Model identifier recorded on each invocation
    fn model(&self) -> &str;

    /// Send the instruction pair and return the raw decoded envelope.
    ///
    /// The expected (but unverified) shape is the OpenAI-style
    /// `choices`/`usage` envelope; callers must check it explicitly.
    async fn send_prompt(&self, system: &str, user: &str) -> LlmResult<Value>;
}

/// Production client for an OpenRouter-style chat-completion endpoint
pub struct OpenRouterClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenRouterClient {
    /// Create a client from service settings
    pub fn new(settings: &Settings) -> Self {
        Self::with_endpoint(
            settings.openrouter_api_key.clone(),
            settings.llm_base_url.clone(),
            settings.llm_model.clone(),
        )
    }

    /// Create a client against an explicit endpoint (used by tests)
    pub fn with_endpoint(api_key: Option<String>, base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            base_url,
            model,
            client,
        }
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send_prompt(&self, system: &str, user: &str) -> LlmResult<Value> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LlmError::AuthenticationFailed {
                message: "API key not configured for OpenRouter".to_string(),
            })?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("HTTP-Referer", HTTP_REFERER)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        seconds: REQUEST_TIMEOUT.as_secs(),
                    }
                } else {
                    LlmError::NetworkError {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            return Err(parse_http_error(status, &body_text));
        }

        serde_json::from_str(&body_text).map_err(|e| LlmError::MalformedEnvelope {
            message: format!("response body is not JSON: {}", e),
        })
    }
}

/// Content string of the first choice, if the envelope carries one
pub fn extract_content(raw: &Value) -> Option<&str> {
    raw.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

/// Prompt and completion token counts from the usage block
pub fn extract_usage(raw: &Value) -> (Option<i64>, Option<i64>) {
    let usage = raw.get("usage");
    let field = |name: &str| {
        usage
            .and_then(|u| u.get(name))
            .and_then(Value::as_i64)
    };
    (field("prompt_tokens"), field("completion_tokens"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_http_error_mapping() {
        assert!(matches!(
            parse_http_error(401, "no key"),
            LlmError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            parse_http_error(429, "slow down"),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            parse_http_error(503, "overloaded"),
            LlmError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            parse_http_error(400, "bad body"),
            LlmError::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_extract_content() {
        let raw = json!({
            "choices": [{"message": {"content": "{\"resumen\":\"ok\"}"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40}
        });
        assert_eq!(extract_content(&raw), Some("{\"resumen\":\"ok\"}"));
        assert_eq!(extract_usage(&raw), (Some(120), Some(40)));
    }

    #[test]
    fn test_missing_choices_is_detectable() {
        let raw = json!({"error": {"message": "model unavailable"}});
        assert_eq!(extract_content(&raw), None);
        assert_eq!(extract_usage(&raw), (None, None));
    }

    #[test]
    fn test_empty_choices_list() {
        let raw = json!({"choices": []});
        assert_eq!(extract_content(&raw), None);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let client = OpenRouterClient::with_endpoint(
            None,
            "http://127.0.0.1:9/unreachable".to_string(),
            "test-model".to_string(),
        );
        let err = client.send_prompt("s", "u").await.unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed { .. }));
    }

    #[test]
    fn test_llm_error_converts_to_app_error() {
        let err: AppError = LlmError::Timeout { seconds: 60 }.into();
        assert!(matches!(err, AppError::Model(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
