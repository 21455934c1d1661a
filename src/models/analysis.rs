//! Analysis Lifecycle Model
//!
//! An analysis is created in PROCESANDO when a snapshot arrives and moves to
//! exactly one terminal state (COMPLETADO or ERROR) when the pipeline ends.
//! Terminal states are final; a correction requires a new analysis.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisState {
    #[serde(rename = "PROCESANDO")]
    Procesando,
    #[serde(rename = "COMPLETADO")]
    Completado,
    #[serde(rename = "ERROR")]
    Error,
}

impl AnalysisState {
    /// Wire/storage representation of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Procesando => "PROCESANDO",
            Self::Completado => "COMPLETADO",
            Self::Error => "ERROR",
        }
    }

    /// Parse a stored state string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PROCESANDO" => Some(Self::Procesando),
            "COMPLETADO" => Some(Self::Completado),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether this state is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Procesando)
    }
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analysis row as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: String,
    pub proyecto_codigo: String,
    pub estado: AnalysisState,
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [
            AnalysisState::Procesando,
            AnalysisState::Completado,
            AnalysisState::Error,
        ] {
            assert_eq!(AnalysisState::parse(state.as_str()), Some(state));
        }
    }

    #[test]
    fn test_state_json_format() {
        assert_eq!(
            serde_json::to_string(&AnalysisState::Completado).unwrap(),
            "\"COMPLETADO\""
        );
        assert_eq!(
            serde_json::to_string(&AnalysisState::Error).unwrap(),
            "\"ERROR\""
        );
    }

    #[test]
    fn test_unknown_state_rejected() {
        assert_eq!(AnalysisState::parse("PENDIENTE"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!AnalysisState::Procesando.is_terminal());
        assert!(AnalysisState::Completado.is_terminal());
        assert!(AnalysisState::Error.is_terminal());
    }
}
