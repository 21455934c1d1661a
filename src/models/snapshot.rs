//! Snapshot Payload and Derived Sub-Records
//!
//! A snapshot is one immutable submission of a project's structured state.
//! The payload is an arbitrary JSON document; it is stored verbatim and,
//! at ingestion time, projected into typed sub-records via best-effort
//! extraction. Extraction is total: a malformed list entry is skipped and
//! missing or wrong-typed fields become `None`, never an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound snapshot submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRequest {
    pub proyecto_codigo: String,
    pub datos: Value,
}

/// Project header extracted from `datos.proyecto`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectHeader {
    pub codigo: Option<String>,
    pub nombre: Option<String>,
    pub responsable_tecnico: Option<String>,
}

/// One stage entry extracted from `datos.etapas[]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub nombre: Option<String>,
    pub estado: Option<String>,
    pub avance_estimado: Option<f64>,
}

/// One progress entry extracted from `datos.registros_avance[]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub fecha_registro: Option<NaiveDate>,
    pub supervisor: Option<String>,
    pub porcentaje_avance: Option<f64>,
    pub presenta_desvios: bool,
    pub tareas_ejecutadas: Vec<String>,
    pub oficios_activos: Vec<String>,
}

/// Safety-compliance summary derived from `datos.medidas_seguridad[]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySummary {
    pub total_medidas_chequeadas: i64,
    pub total_cumplen: i64,
    pub cumple_todas: bool,
    /// Original measure list, retained for audit
    pub medidas_implementadas: Value,
}

/// Typed projection of a snapshot payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotExtract {
    pub proyecto: ProjectHeader,
    pub etapas: Vec<StageRecord>,
    pub avances: Vec<ProgressRecord>,
    pub seguridad: Option<SafetySummary>,
}

impl SnapshotExtract {
    /// Project the payload into typed sub-records.
    ///
    /// Non-object entries in `etapas` and `registros_avance` are skipped
    /// (and logged at debug); everything else degrades to `None`/defaults.
    pub fn from_payload(datos: &Value) -> Self {
        let proyecto = datos
            .get("proyecto")
            .map(|p| ProjectHeader {
                codigo: opt_string(p, "codigo"),
                nombre: opt_string(p, "nombre"),
                responsable_tecnico: opt_string(p, "responsable_tecnico"),
            })
            .unwrap_or_default();

        let etapas = list_entries(datos, "etapas")
            .into_iter()
            .map(|etapa| StageRecord {
                nombre: opt_string(etapa, "nombre"),
                estado: opt_string(etapa, "estado"),
                avance_estimado: opt_f64(etapa, "avance_estimado"),
            })
            .collect();

        let avances = list_entries(datos, "registros_avance")
            .into_iter()
            .map(|avance| ProgressRecord {
                fecha_registro: opt_string(avance, "fecha")
                    .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                supervisor: opt_string(avance, "supervisor"),
                porcentaje_avance: opt_f64(avance, "porcentaje_avance"),
                presenta_desvios: avance
                    .get("presenta_desvios")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                tareas_ejecutadas: string_list(avance, "tareas_ejecutadas"),
                oficios_activos: string_list(avance, "oficios_activos"),
            })
            .collect();

        let seguridad = match datos.get("medidas_seguridad").and_then(Value::as_array) {
            Some(medidas) if !medidas.is_empty() => {
                let total = medidas.len() as i64;
                let cumplen = medidas
                    .iter()
                    .filter(|m| m.get("cumple").and_then(Value::as_bool) == Some(true))
                    .count() as i64;
                Some(SafetySummary {
                    total_medidas_chequeadas: total,
                    total_cumplen: cumplen,
                    cumple_todas: total == cumplen,
                    medidas_implementadas: Value::Array(medidas.clone()),
                })
            }
            _ => None,
        };

        Self {
            proyecto,
            etapas,
            avances,
            seguridad,
        }
    }
}

/// Object entries of `datos[key]`, skipping anything that is not an object
fn list_entries<'a>(datos: &'a Value, key: &str) -> Vec<&'a Value> {
    let entries = match datos.get(key).and_then(Value::as_array) {
        Some(array) => array,
        None => return Vec::new(),
    };
    entries
        .iter()
        .filter(|entry| {
            let keep = entry.is_object();
            if !keep {
                tracing::debug!(key, "skipping malformed snapshot entry");
            }
            keep
        })
        .collect()
}

fn opt_string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn opt_f64(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_extraction() {
        let datos = json!({
            "proyecto": {
                "codigo": "OB-1",
                "nombre": "Torre Norte",
                "responsable_tecnico": "Ing. Paz"
            },
            "etapas": [
                {"nombre": "Fundaciones", "estado": "terminada", "avance_estimado": 100.0},
                {"nombre": "Estructura", "estado": "en_curso", "avance_estimado": 45.5}
            ],
            "registros_avance": [
                {
                    "fecha": "2026-08-01",
                    "supervisor": "L. Soto",
                    "porcentaje_avance": 40.0,
                    "presenta_desvios": true,
                    "tareas_ejecutadas": ["hormigonado", "encofrado"],
                    "oficios_activos": ["albañilería"]
                }
            ],
            "medidas_seguridad": [
                {"nombre": "casco", "cumple": true},
                {"nombre": "arnés", "cumple": false}
            ]
        });

        let extract = SnapshotExtract::from_payload(&datos);
        assert_eq!(extract.proyecto.codigo.as_deref(), Some("OB-1"));
        assert_eq!(extract.etapas.len(), 2);
        assert_eq!(extract.avances.len(), 1);
        assert!(extract.avances[0].presenta_desvios);
        assert_eq!(extract.avances[0].tareas_ejecutadas.len(), 2);
        assert_eq!(
            extract.avances[0].fecha_registro,
            NaiveDate::from_ymd_opt(2026, 8, 1)
        );

        let seguridad = extract.seguridad.expect("safety summary present");
        assert_eq!(seguridad.total_medidas_chequeadas, 2);
        assert_eq!(seguridad.total_cumplen, 1);
        assert!(!seguridad.cumple_todas);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let datos = json!({
            "etapas": [{"nombre": "A"}, "no soy un objeto", 42, null],
            "registros_avance": [["lista"], {"supervisor": "X"}]
        });

        let extract = SnapshotExtract::from_payload(&datos);
        assert_eq!(extract.etapas.len(), 1);
        assert_eq!(extract.avances.len(), 1);
        assert_eq!(extract.avances[0].supervisor.as_deref(), Some("X"));
    }

    #[test]
    fn test_empty_payload_yields_defaults() {
        let extract = SnapshotExtract::from_payload(&json!({}));
        assert_eq!(extract.proyecto, ProjectHeader::default());
        assert!(extract.etapas.is_empty());
        assert!(extract.avances.is_empty());
        assert!(extract.seguridad.is_none());
    }

    #[test]
    fn test_wrong_typed_fields_become_none() {
        let datos = json!({
            "proyecto": {"codigo": 99, "nombre": ["x"]},
            "etapas": [{"nombre": "A", "avance_estimado": "mucho"}],
            "registros_avance": [{"fecha": "31/12/2026", "presenta_desvios": "sí"}]
        });

        let extract = SnapshotExtract::from_payload(&datos);
        assert!(extract.proyecto.codigo.is_none());
        assert!(extract.etapas[0].avance_estimado.is_none());
        assert!(extract.avances[0].fecha_registro.is_none());
        assert!(!extract.avances[0].presenta_desvios);
    }

    #[test]
    fn test_all_compliant_safety_summary() {
        let datos = json!({
            "medidas_seguridad": [{"cumple": true}, {"cumple": true}]
        });
        let seguridad = SnapshotExtract::from_payload(&datos).seguridad.unwrap();
        assert!(seguridad.cumple_todas);
        assert_eq!(seguridad.total_cumplen, 2);
    }

    #[test]
    fn test_empty_safety_list_has_no_summary() {
        let datos = json!({"medidas_seguridad": []});
        assert!(SnapshotExtract::from_payload(&datos).seguridad.is_none());
    }
}
