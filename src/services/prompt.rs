//! Prompt Builder
//!
//! Turns a snapshot payload into the fixed-role instruction pair sent to
//! the model. Pure function: no state, no failure modes. The payload is
//! embedded between explicit delimiters so the model can tell instruction
//! from data regardless of what the snapshot contains.

use serde_json::Value;

/// System persona and output contract for the auditing model
const SYSTEM_PROMPT: &str = "\
Eres un auditor experto en obras de construcción. Analizas el estado de un \
proyecto y detectas riesgos e incoherencias internas en los datos reportados.

Responde únicamente con un objeto JSON válido, sin texto adicional, con esta forma:
{
  \"resumen\": \"síntesis del estado de la obra\",
  \"score_coherencia\": 0-100,
  \"riesgos\": [
    {\"titulo\": \"...\", \"descripcion\": \"...\", \"nivel\": \"CRITICO|ATENCION|INFORMATIVO\"}
  ]
}
Si no detectas riesgos, devuelve \"riesgos\" como lista vacía.";

/// Delimiter fencing the serialized payload inside the user prompt
const PAYLOAD_DELIMITER: &str = "=====DATOS=====";

/// Instruction pair for one model invocation
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Stateless builder for audit instruction pairs
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the (system, user) pair for a snapshot.
    ///
    /// Never panics: any payload shape is stringified safely.
    pub fn build(proyecto_codigo: &str, datos: &Value) -> PromptPair {
        let serialized = serde_json::to_string_pretty(datos)
            .unwrap_or_else(|_| datos.to_string());

        let user = format!(
            "Analiza el estado actual del proyecto de obra \"{codigo}\".\n\n\
             Los datos del snapshot están entre los delimitadores:\n\
             {delim}\n{datos}\n{delim}\n\n\
             Devuelve estrictamente un único objeto JSON con el contrato indicado.",
            codigo = proyecto_codigo,
            delim = PAYLOAD_DELIMITER,
            datos = serialized,
        );

        PromptPair {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}
