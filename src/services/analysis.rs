//! Analysis Orchestrator
//!
//! Sequences the pipeline: ingestion commit, prompt build, audited model
//! invocation, response parsing and outcome commit, then the best-effort
//! completion webhook. Enforces the PROCESANDO -> {COMPLETADO, ERROR} state
//! machine: every run leaves the analysis in exactly one terminal state
//! before this service returns.
//!
//! Two durable commit boundaries, never one transaction spanning the
//! external call: the snapshot is committed before the model is invoked,
//! so a timeout or crash during the call can never lose input data.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use crate::models::analysis::AnalysisState;
use crate::models::detail::AnalysisDetail;
use crate::models::result::{parse_model_content, AuditContent};
use crate::models::snapshot::{SnapshotExtract, SnapshotRequest};
use crate::services::llm::{self, ModelClient};
use crate::services::prompt::PromptBuilder;
use crate::services::webhook::WebhookClient;
use crate::storage::database::{Database, InvocationOutcome};
use crate::utils::error::{AppError, AppResult};

/// Successful pipeline outcome returned to the caller
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisStarted {
    pub analisis_id: String,
    /// Parsed business content exactly as derived from the model reply
    pub resultado: Value,
}

/// Pipeline controller for snapshot analyses
#[derive(Clone)]
pub struct AnalysisService {
    db: Arc<Database>,
    llm: Arc<dyn ModelClient>,
    webhook: Arc<WebhookClient>,
}

impl AnalysisService {
    pub fn new(db: Arc<Database>, llm: Arc<dyn ModelClient>, webhook: Arc<WebhookClient>) -> Self {
        Self { db, llm, webhook }
    }

    /// Run the full analysis pipeline for one snapshot submission.
    ///
    /// Returns the analysis identifier and the parsed audit content, or a
    /// typed error after the ERROR state has been durably committed.
    pub async fn start_analysis(&self, request: SnapshotRequest) -> AppResult<AnalysisStarted> {
        let analysis_id = Uuid::new_v4().to_string();
        let snapshot_id = Uuid::new_v4().to_string();

        tracing::info!(
            analisis_id = %analysis_id,
            proyecto = %request.proyecto_codigo,
            "snapshot received"
        );

        // Ingestion commit: the snapshot must survive even if the model
        // call never completes.
        let extract = SnapshotExtract::from_payload(&request.datos);
        self.db.ingest_snapshot(
            &analysis_id,
            &snapshot_id,
            &request.proyecto_codigo,
            &request.datos,
            &extract,
        )?;
        tracing::info!(analisis_id = %analysis_id, "snapshot and sub-records committed");

        match self.run_model_phase(&analysis_id, &request).await {
            Ok(resultado) => {
                self.notify(&analysis_id, &request.proyecto_codigo, AnalysisState::Completado);
                Ok(AnalysisStarted {
                    analisis_id: analysis_id,
                    resultado,
                })
            }
            Err(e) => {
                // The failure commits set ERROR atomically with the
                // invocation detail; this covers paths where no outcome
                // commit ran at all.
                if let Err(mark_err) = self.db.mark_error_if_processing(&analysis_id) {
                    tracing::error!(
                        analisis_id = %analysis_id,
                        error = %mark_err,
                        "failed to commit ERROR state"
                    );
                }
                self.notify(&analysis_id, &request.proyecto_codigo, AnalysisState::Error);
                tracing::error!(analisis_id = %analysis_id, error = %e, "analysis failed");
                Err(e)
            }
        }
    }

    /// Invocation, parsing and outcome commit (pipeline steps 2-8)
    async fn run_model_phase(
        &self,
        analysis_id: &str,
        request: &SnapshotRequest,
    ) -> AppResult<Value> {
        let prompts = PromptBuilder::build(&request.proyecto_codigo, &request.datos);

        // Invocation and prompts are durable before the external call.
        let invocation_id = Uuid::new_v4().to_string();
        let invocado_at = chrono::Utc::now().to_rfc3339();
        self.db.record_invocation(
            &invocation_id,
            analysis_id,
            self.llm.model(),
            &invocado_at,
            &prompts,
        )?;

        tracing::info!(
            analisis_id = %analysis_id,
            modelo = self.llm.model(),
            "invoking model"
        );
        let started = Instant::now();
        let outcome = self.llm.send_prompt(&prompts.system, &prompts.user).await;
        let duracion_ms = started.elapsed().as_millis() as i64;

        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                self.db.commit_invocation_failure(
                    analysis_id,
                    &invocation_id,
                    duracion_ms,
                    &e.to_string(),
                    None,
                )?;
                return Err(e.into());
            }
        };

        // The missing-"choices" envelope is an explicit failure, with the
        // whole raw response stored as the error detail.
        let content_str = match llm::extract_content(&raw) {
            Some(content) => content.to_owned(),
            None => {
                self.db.commit_invocation_failure(
                    analysis_id,
                    &invocation_id,
                    duracion_ms,
                    &raw.to_string(),
                    None,
                )?;
                return Err(AppError::model(
                    "model response is missing the choices envelope",
                ));
            }
        };

        let (tokens_prompt, tokens_respuesta) = llm::extract_usage(&raw);

        // Unparseable content also terminates in ERROR, but the raw text is
        // kept for forensic review.
        let parsed = match parse_model_content(&content_str) {
            Some(parsed) => parsed,
            None => {
                self.db.commit_invocation_failure(
                    analysis_id,
                    &invocation_id,
                    duracion_ms,
                    "model content is not JSON and contains no embedded object",
                    Some(&content_str),
                )?;
                return Err(AppError::parse("model content is not parseable JSON"));
            }
        };

        let content = AuditContent::from_value(&parsed);
        let resultado_id = Uuid::new_v4().to_string();
        self.db.commit_invocation_success(&InvocationOutcome {
            analysis_id,
            invocation_id: &invocation_id,
            duracion_ms,
            tokens_prompt,
            tokens_respuesta,
            respuesta_raw: &content_str,
            respuesta_parseada: &parsed,
            resultado_id: &resultado_id,
            content: &content,
        })?;

        tracing::info!(
            analisis_id = %analysis_id,
            duracion_ms,
            riesgos = content.riesgos.len(),
            "analysis completed"
        );
        Ok(parsed)
    }

    /// Composed read of one analysis, or NotFound
    pub fn detail(&self, analysis_id: &str) -> AppResult<AnalysisDetail> {
        self.db
            .get_analysis_detail(analysis_id)?
            .ok_or_else(|| AppError::not_found(format!("analysis {}", analysis_id)))
    }

    /// Fire-and-forget terminal-state notification
    fn notify(&self, analysis_id: &str, proyecto_codigo: &str, estado: AnalysisState) {
        let webhook = Arc::clone(&self.webhook);
        let analysis_id = analysis_id.to_owned();
        let proyecto_codigo = proyecto_codigo.to_owned();
        tokio::spawn(async move {
            webhook
                .notify_completion(&analysis_id, &proyecto_codigo, estado)
                .await;
        });
    }
}
