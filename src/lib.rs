//! Obra Audit Service Library
//!
//! Accepts structured construction-project snapshots, persists them
//! durably, audits them for risks through an external language model with
//! a full invocation audit trail, and derives structured business findings
//! (risk observations, coherence score) stored alongside the original data.
//!
//! - HTTP layer (warp routes)
//! - Business logic services (orchestrator, prompt builder, model client,
//!   webhook sink)
//! - Storage layer (SQLite)
//! - Data models and utilities

pub mod api;
pub mod models;
pub mod services;
pub mod settings;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::analysis::AnalysisState;
pub use models::detail::AnalysisDetail;
pub use models::snapshot::SnapshotRequest;
pub use services::analysis::{AnalysisService, AnalysisStarted};
pub use services::llm::{LlmError, ModelClient, OpenRouterClient};
pub use services::webhook::WebhookClient;
pub use settings::Settings;
pub use state::AppState;
pub use storage::database::Database;
pub use utils::error::{AppError, AppResult};
