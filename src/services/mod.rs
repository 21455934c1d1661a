//! Business Logic Services
//!
//! The analysis orchestrator and its collaborators: prompt building, the
//! model client boundary, and the webhook notification sink.

pub mod analysis;
pub mod llm;
pub mod prompt;
pub mod webhook;

pub use analysis::{AnalysisService, AnalysisStarted};
pub use llm::{LlmError, LlmResult, ModelClient, OpenRouterClient};
pub use prompt::{PromptBuilder, PromptPair};
pub use webhook::WebhookClient;
