//! Business Findings Derived From the Model Response
//!
//! The model is contracted to answer with a single JSON object holding
//! `resumen`, `score_coherencia` (0-100) and `riesgos[]`. Models wrap JSON
//! in prose often enough that parsing is two-stage: direct parse first,
//! then the first embedded top-level object literal. Field extraction is
//! best-effort; a missing field is `None`, never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One risk finding produced by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    /// Severity level; the prompt contract constrains it to
    /// CRITICO / ATENCION / INFORMATIVO, stored as the model sent it
    pub nivel: Option<String>,
}

/// Parsed business content of a successful audit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditContent {
    pub resumen: Option<String>,
    pub score_coherencia: Option<f64>,
    pub riesgos: Vec<RiskEntry>,
}

impl AuditContent {
    /// Extract audit fields from a parsed JSON object.
    ///
    /// Non-object entries in `riesgos` are skipped.
    pub fn from_value(value: &Value) -> Self {
        let riesgos = value
            .get("riesgos")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.is_object())
                    .map(|e| RiskEntry {
                        titulo: opt_string(e, "titulo"),
                        descripcion: opt_string(e, "descripcion"),
                        nivel: opt_string(e, "nivel"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            resumen: opt_string(value, "resumen"),
            score_coherencia: value.get("score_coherencia").and_then(Value::as_f64),
            riesgos,
        }
    }

    /// True iff the model reported at least one risk
    pub fn detecta_riesgos(&self) -> bool {
        !self.riesgos.is_empty()
    }
}

/// Parse the model's content string into a JSON object.
///
/// Tries a direct parse first; if that fails (or yields a non-object),
/// falls back to the span between the first `{` and the last `}` of the
/// text. Returns `None` when neither attempt produces an object.
pub fn parse_model_content(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        if value.is_object() {
            return Some(value);
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&raw[start..=end])
        .ok()
        .filter(Value::is_object)
}

/// One stored observation, as exposed by the detail query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    pub nivel: Option<String>,
}

/// Stored analysis result with its observations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultView {
    pub resumen_general: Option<String>,
    pub score_coherencia: Option<f64>,
    pub detecta_riesgos: bool,
    pub observaciones: Vec<Observation>,
}

fn opt_string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_parse() {
        let parsed =
            parse_model_content(r#"{"resumen":"ok","score_coherencia":90,"riesgos":[]}"#).unwrap();
        let content = AuditContent::from_value(&parsed);
        assert_eq!(content.resumen.as_deref(), Some("ok"));
        assert_eq!(content.score_coherencia, Some(90.0));
        assert!(!content.detecta_riesgos());
    }

    #[test]
    fn test_embedded_object_parse() {
        let raw = r#"Here: {"resumen":"x","score_coherencia":50,"riesgos":[{"titulo":"T","descripcion":"D","nivel":"CRITICO"}]}"#;
        let parsed = parse_model_content(raw).unwrap();
        let content = AuditContent::from_value(&parsed);
        assert_eq!(content.riesgos.len(), 1);
        assert_eq!(content.riesgos[0].nivel.as_deref(), Some("CRITICO"));
        assert!(content.detecta_riesgos());
    }

    #[test]
    fn test_markdown_fenced_json() {
        let raw = "```json\n{\"resumen\":\"ok\",\"riesgos\":[]}\n```";
        let parsed = parse_model_content(raw).unwrap();
        assert_eq!(parsed["resumen"], "ok");
    }

    #[test]
    fn test_unparseable_content() {
        assert!(parse_model_content("no json here").is_none());
        assert!(parse_model_content("unbalanced { brace").is_none());
        assert!(parse_model_content("} reversed {").is_none());
    }

    #[test]
    fn test_non_object_json_rejected() {
        assert!(parse_model_content("42").is_none());
        assert!(parse_model_content("[1, 2]").is_none());
        assert!(parse_model_content("\"texto\"").is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let content = AuditContent::from_value(&json!({}));
        assert!(content.resumen.is_none());
        assert!(content.score_coherencia.is_none());
        assert!(content.riesgos.is_empty());
    }

    #[test]
    fn test_malformed_risk_entries_skipped() {
        let content = AuditContent::from_value(&json!({
            "riesgos": [{"titulo": "T"}, "texto suelto", 7]
        }));
        assert_eq!(content.riesgos.len(), 1);
        assert!(content.riesgos[0].nivel.is_none());
    }
}
