//! Composed Detail View
//!
//! The full read-side view of one analysis: snapshot summary, invocation
//! audit trail with token totals, and the derived result. Assembled from
//! the store without mutation or external calls.

use serde::{Deserialize, Serialize};

use super::analysis::AnalysisState;
use super::result::ResultView;
use super::snapshot::{ProjectHeader, SafetySummary};

/// Summary of the ingested snapshot data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub proyecto: Option<ProjectHeader>,
    pub etapas: usize,
    pub registros_avance: usize,
    pub seguridad: Option<SafetySummary>,
}

/// One invocation entry of the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationAudit {
    pub modelo: String,
    pub invocado_at: String,
    pub exitosa: Option<bool>,
    pub duracion_ms: Option<i64>,
    /// Prompt plus response tokens, missing counts treated as zero
    pub tokens: i64,
    pub error_detalle: Option<String>,
}

/// Full composed view of an analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDetail {
    pub id: String,
    pub proyecto_codigo: String,
    pub estado: AnalysisState,
    pub created_at: Option<String>,
    pub datos_obra: SnapshotSummary,
    pub auditoria: Vec<InvocationAudit>,
    pub resultado: Option<ResultView>,
}
