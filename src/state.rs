//! Application State
//!
//! Dependency-injected context wired once at startup and shared by the
//! HTTP layer. Keeps the orchestrator testable in isolation: tests build
//! the same state from an in-memory database and a scripted model client.

use std::sync::Arc;

use crate::services::analysis::AnalysisService;
use crate::services::llm::{ModelClient, OpenRouterClient};
use crate::services::webhook::WebhookClient;
use crate::settings::Settings;
use crate::storage::database::Database;
use crate::utils::error::AppResult;

/// Shared application state
pub struct AppState {
    pub db: Arc<Database>,
    pub analysis: AnalysisService,
}

impl AppState {
    /// Wire production collaborators from settings
    pub fn new(settings: &Settings) -> AppResult<Self> {
        let db = Arc::new(Database::new(&settings.database_path)?);
        let llm: Arc<dyn ModelClient> = Arc::new(OpenRouterClient::new(settings));
        let webhook = Arc::new(WebhookClient::new(settings.webhook_url.clone()));
        Ok(Self::with_parts(db, llm, webhook))
    }

    /// Wire explicit collaborators (used by tests)
    pub fn with_parts(
        db: Arc<Database>,
        llm: Arc<dyn ModelClient>,
        webhook: Arc<WebhookClient>,
    ) -> Self {
        let analysis = AnalysisService::new(Arc::clone(&db), llm, webhook);
        Self { db, analysis }
    }
}
