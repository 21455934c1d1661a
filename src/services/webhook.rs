//! Webhook Notification Sink
//!
//! Best-effort notification of terminal pipeline states to an external
//! collaborator. Delivery failures are logged and never surfaced to the
//! caller; by the time a notification is sent the terminal state is
//! already durably committed.

use std::time::Duration;

use serde_json::Value;

use crate::models::analysis::AnalysisState;

/// Timeout for one notification attempt
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Fire-and-forget webhook client
#[derive(Clone)]
pub struct WebhookClient {
    url: Option<String>,
    client: reqwest::Client,
}

impl WebhookClient {
    /// Create a client; `None` disables notifications entirely
    pub fn new(url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { url, client }
    }

    /// Build the notification body for a terminal state
    pub fn build_payload(
        analisis_id: &str,
        proyecto_codigo: &str,
        estado: AnalysisState,
    ) -> Value {
        serde_json::json!({
            "analisis_id": analisis_id,
            "proyecto_codigo": proyecto_codigo,
            "estado": estado,
        })
    }

    /// Notify the sink that an analysis reached a terminal state.
    ///
    /// Logging only: no error is returned and nothing is retried.
    pub async fn notify_completion(
        &self,
        analisis_id: &str,
        proyecto_codigo: &str,
        estado: AnalysisState,
    ) {
        let url = match &self.url {
            Some(url) => url,
            None => {
                tracing::debug!(analisis_id, "webhook not configured, skipping notification");
                return;
            }
        };

        let payload = Self::build_payload(analisis_id, proyecto_codigo, estado);
        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(analisis_id, estado = %estado, "webhook notification delivered");
            }
            Ok(response) => {
                tracing::warn!(
                    analisis_id,
                    status = response.status().as_u16(),
                    "webhook notification rejected"
                );
            }
            Err(e) => {
                tracing::warn!(analisis_id, error = %e, "webhook notification failed");
            }
        }
    }
}
