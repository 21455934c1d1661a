//! SQLite Database
//!
//! Embedded database for the analysis entity graph using rusqlite with r2d2
//! connection pooling. The pipeline's durability guarantees live here: the
//! ingestion commit and the outcome commit are each a single transaction,
//! and no transaction is ever held open across the external model call.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde_json::Value;

use crate::models::analysis::{Analysis, AnalysisState};
use crate::models::detail::{AnalysisDetail, InvocationAudit, SnapshotSummary};
use crate::models::result::{AuditContent, Observation, ResultView};
use crate::models::snapshot::{ProjectHeader, SafetySummary, SnapshotExtract};
use crate::services::prompt::PromptPair;
use crate::utils::error::{AppError, AppResult};

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Everything committed atomically when an invocation succeeds
#[derive(Debug)]
pub struct InvocationOutcome<'a> {
    pub analysis_id: &'a str,
    pub invocation_id: &'a str,
    pub duracion_ms: i64,
    pub tokens_prompt: Option<i64>,
    pub tokens_respuesta: Option<i64>,
    pub respuesta_raw: &'a str,
    pub respuesta_parseada: &'a Value,
    pub resultado_id: &'a str,
    pub content: &'a AuditContent,
}

/// Database service for the analysis stores
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at the given path
    pub fn new(path: &std::path::Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON"));
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database with the production schema.
    ///
    /// Single pooled connection so every caller sees the same data. Used by
    /// unit and integration tests.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON"));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS analisis (
                id TEXT PRIMARY KEY,
                proyecto_codigo TEXT NOT NULL,
                estado TEXT NOT NULL DEFAULT 'PROCESANDO',
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                id TEXT PRIMARY KEY,
                analisis_id TEXT NOT NULL UNIQUE,
                payload_completo TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (analisis_id) REFERENCES analisis(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS datos_proyecto (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id TEXT NOT NULL,
                codigo TEXT,
                nombre TEXT,
                responsable_tecnico TEXT,
                FOREIGN KEY (snapshot_id) REFERENCES snapshots(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS datos_etapa (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id TEXT NOT NULL,
                nombre TEXT,
                estado TEXT,
                avance_estimado REAL,
                FOREIGN KEY (snapshot_id) REFERENCES snapshots(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS datos_avance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id TEXT NOT NULL,
                fecha_registro TEXT,
                supervisor TEXT,
                porcentaje_avance REAL,
                presenta_desvios INTEGER NOT NULL DEFAULT 0,
                tareas_ejecutadas TEXT NOT NULL DEFAULT '[]',
                oficios_activos TEXT NOT NULL DEFAULT '[]',
                FOREIGN KEY (snapshot_id) REFERENCES snapshots(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS datos_seguridad (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id TEXT NOT NULL,
                fecha_registro TEXT,
                medidas_implementadas TEXT NOT NULL DEFAULT '[]',
                total_medidas_chequeadas INTEGER NOT NULL,
                total_cumplen INTEGER NOT NULL,
                cumple_todas INTEGER NOT NULL,
                FOREIGN KEY (snapshot_id) REFERENCES snapshots(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS invocaciones (
                id TEXT PRIMARY KEY,
                analisis_id TEXT NOT NULL,
                modelo_usado TEXT NOT NULL,
                invocado_at TEXT NOT NULL,
                duracion_ms INTEGER,
                exitosa INTEGER,
                tokens_prompt INTEGER,
                tokens_respuesta INTEGER,
                error_detalle TEXT,
                FOREIGN KEY (analisis_id) REFERENCES analisis(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS prompts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                invocacion_id TEXT NOT NULL UNIQUE,
                system_prompt TEXT NOT NULL,
                user_prompt TEXT NOT NULL,
                FOREIGN KEY (invocacion_id) REFERENCES invocaciones(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS respuestas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                invocacion_id TEXT NOT NULL UNIQUE,
                respuesta_raw TEXT NOT NULL,
                respuesta_parseada TEXT,
                FOREIGN KEY (invocacion_id) REFERENCES invocaciones(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS resultados (
                id TEXT PRIMARY KEY,
                analisis_id TEXT NOT NULL UNIQUE,
                resumen_general TEXT,
                score_coherencia REAL,
                detecta_riesgos INTEGER NOT NULL,
                FOREIGN KEY (analisis_id) REFERENCES analisis(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS observaciones (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                resultado_id TEXT NOT NULL,
                titulo TEXT,
                descripcion TEXT,
                nivel TEXT,
                FOREIGN KEY (resultado_id) REFERENCES resultados(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_invocaciones_analisis_id
             ON invocaciones(analisis_id)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_analisis_proyecto_codigo
             ON analisis(proyecto_codigo)",
            [],
        )?;

        Ok(())
    }

    /// Check that the database answers a trivial query
    pub fn ping(&self) -> bool {
        match self.get_connection() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => false,
        }
    }

    // ========================================================================
    // Ingestion commit (pipeline step 1)
    // ========================================================================

    /// Create the analysis in PROCESANDO together with its snapshot and all
    /// derived sub-records, in one transaction.
    ///
    /// This commit happens before any external call, so the snapshot
    /// survives a model failure or a crash during the invocation.
    pub fn ingest_snapshot(
        &self,
        analysis_id: &str,
        snapshot_id: &str,
        proyecto_codigo: &str,
        payload: &Value,
        extract: &SnapshotExtract,
    ) -> AppResult<()> {
        let conn = self.get_connection()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO analisis (id, proyecto_codigo, estado) VALUES (?1, ?2, ?3)",
            params![
                analysis_id,
                proyecto_codigo,
                AnalysisState::Procesando.as_str()
            ],
        )?;

        tx.execute(
            "INSERT INTO snapshots (id, analisis_id, payload_completo) VALUES (?1, ?2, ?3)",
            params![snapshot_id, analysis_id, payload.to_string()],
        )?;

        tx.execute(
            "INSERT INTO datos_proyecto (snapshot_id, codigo, nombre, responsable_tecnico)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot_id,
                extract.proyecto.codigo,
                extract.proyecto.nombre,
                extract.proyecto.responsable_tecnico
            ],
        )?;

        for etapa in &extract.etapas {
            tx.execute(
                "INSERT INTO datos_etapa (snapshot_id, nombre, estado, avance_estimado)
                 VALUES (?1, ?2, ?3, ?4)",
                params![snapshot_id, etapa.nombre, etapa.estado, etapa.avance_estimado],
            )?;
        }

        for avance in &extract.avances {
            tx.execute(
                "INSERT INTO datos_avance
                 (snapshot_id, fecha_registro, supervisor, porcentaje_avance,
                  presenta_desvios, tareas_ejecutadas, oficios_activos)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    snapshot_id,
                    avance.fecha_registro.map(|d| d.to_string()),
                    avance.supervisor,
                    avance.porcentaje_avance,
                    avance.presenta_desvios,
                    serde_json::to_string(&avance.tareas_ejecutadas)?,
                    serde_json::to_string(&avance.oficios_activos)?,
                ],
            )?;
        }

        if let Some(seguridad) = &extract.seguridad {
            tx.execute(
                "INSERT INTO datos_seguridad
                 (snapshot_id, fecha_registro, medidas_implementadas,
                  total_medidas_chequeadas, total_cumplen, cumple_todas)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    snapshot_id,
                    chrono::Utc::now().date_naive().to_string(),
                    seguridad.medidas_implementadas.to_string(),
                    seguridad.total_medidas_chequeadas,
                    seguridad.total_cumplen,
                    seguridad.cumple_todas,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // ========================================================================
    // Invocation audit trail (pipeline steps 3-8)
    // ========================================================================

    /// Persist a new invocation and its prompt pair, durably, before the
    /// external call is made.
    pub fn record_invocation(
        &self,
        invocation_id: &str,
        analysis_id: &str,
        modelo_usado: &str,
        invocado_at: &str,
        prompts: &PromptPair,
    ) -> AppResult<()> {
        let conn = self.get_connection()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO invocaciones (id, analisis_id, modelo_usado, invocado_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![invocation_id, analysis_id, modelo_usado, invocado_at],
        )?;

        tx.execute(
            "INSERT INTO prompts (invocacion_id, system_prompt, user_prompt)
             VALUES (?1, ?2, ?3)",
            params![invocation_id, prompts.system, prompts.user],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Commit a failed invocation and the ERROR terminal state atomically.
    ///
    /// When the failure happened after a response body was received (an
    /// unparseable content case), the raw text is persisted with a NULL
    /// parsed column for forensic review.
    pub fn commit_invocation_failure(
        &self,
        analysis_id: &str,
        invocation_id: &str,
        duracion_ms: i64,
        error_detalle: &str,
        respuesta_raw: Option<&str>,
    ) -> AppResult<()> {
        let conn = self.get_connection()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "UPDATE invocaciones
             SET exitosa = 0, duracion_ms = ?2, error_detalle = ?3
             WHERE id = ?1",
            params![invocation_id, duracion_ms, error_detalle],
        )?;

        if let Some(raw) = respuesta_raw {
            tx.execute(
                "INSERT INTO respuestas (invocacion_id, respuesta_raw, respuesta_parseada)
                 VALUES (?1, ?2, NULL)",
                params![invocation_id, raw],
            )?;
        }

        tx.execute(
            "UPDATE analisis SET estado = ?2 WHERE id = ?1",
            params![analysis_id, AnalysisState::Error.as_str()],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Commit a successful invocation: response record, business result with
    /// its observations, and the COMPLETADO terminal state, atomically.
    pub fn commit_invocation_success(&self, outcome: &InvocationOutcome<'_>) -> AppResult<()> {
        let conn = self.get_connection()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "UPDATE invocaciones
             SET exitosa = 1, duracion_ms = ?2, tokens_prompt = ?3, tokens_respuesta = ?4
             WHERE id = ?1",
            params![
                outcome.invocation_id,
                outcome.duracion_ms,
                outcome.tokens_prompt,
                outcome.tokens_respuesta
            ],
        )?;

        tx.execute(
            "INSERT INTO respuestas (invocacion_id, respuesta_raw, respuesta_parseada)
             VALUES (?1, ?2, ?3)",
            params![
                outcome.invocation_id,
                outcome.respuesta_raw,
                outcome.respuesta_parseada.to_string()
            ],
        )?;

        let content = outcome.content;
        tx.execute(
            "INSERT INTO resultados
             (id, analisis_id, resumen_general, score_coherencia, detecta_riesgos)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                outcome.resultado_id,
                outcome.analysis_id,
                content.resumen,
                content.score_coherencia,
                content.detecta_riesgos()
            ],
        )?;

        for riesgo in &content.riesgos {
            tx.execute(
                "INSERT INTO observaciones (resultado_id, titulo, descripcion, nivel)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    outcome.resultado_id,
                    riesgo.titulo,
                    riesgo.descripcion,
                    riesgo.nivel
                ],
            )?;
        }

        tx.execute(
            "UPDATE analisis SET estado = ?2 WHERE id = ?1",
            params![outcome.analysis_id, AnalysisState::Completado.as_str()],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Force the ERROR terminal state if the analysis is still PROCESANDO.
    ///
    /// Safety net for failures where no invocation outcome commit ran
    /// (e.g. the invocation insert itself failed). Idempotent; never
    /// overwrites a terminal state.
    pub fn mark_error_if_processing(&self, analysis_id: &str) -> AppResult<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "UPDATE analisis SET estado = ?2 WHERE id = ?1 AND estado = ?3",
            params![
                analysis_id,
                AnalysisState::Error.as_str(),
                AnalysisState::Procesando.as_str()
            ],
        )?;
        Ok(())
    }

    // ========================================================================
    // Read side
    // ========================================================================

    /// Fetch one analysis row
    pub fn get_analysis(&self, analysis_id: &str) -> AppResult<Option<Analysis>> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            "SELECT id, proyecto_codigo, estado, created_at FROM analisis WHERE id = ?1",
            params![analysis_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        );

        match result {
            Ok((id, proyecto_codigo, estado_raw, created_at)) => {
                let estado = AnalysisState::parse(&estado_raw).ok_or_else(|| {
                    AppError::parse(format!("unknown analysis state '{}'", estado_raw))
                })?;
                Ok(Some(Analysis {
                    id,
                    proyecto_codigo,
                    estado,
                    created_at,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Compose the full detail view of an analysis, or `None` if unknown
    pub fn get_analysis_detail(&self, analysis_id: &str) -> AppResult<Option<AnalysisDetail>> {
        let analysis = match self.get_analysis(analysis_id)? {
            Some(analysis) => analysis,
            None => return Ok(None),
        };

        let conn = self.get_connection()?;

        let snapshot_id: Option<String> = match conn.query_row(
            "SELECT id FROM snapshots WHERE analisis_id = ?1",
            params![analysis_id],
            |row| row.get(0),
        ) {
            Ok(id) => Some(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let datos_obra = match &snapshot_id {
            Some(snapshot_id) => self.snapshot_summary(&conn, snapshot_id)?,
            None => SnapshotSummary {
                proyecto: None,
                etapas: 0,
                registros_avance: 0,
                seguridad: None,
            },
        };

        let auditoria = self.invocation_audit(&conn, analysis_id)?;
        let resultado = self.result_view(&conn, analysis_id)?;

        Ok(Some(AnalysisDetail {
            id: analysis.id,
            proyecto_codigo: analysis.proyecto_codigo,
            estado: analysis.estado,
            created_at: analysis.created_at,
            datos_obra,
            auditoria,
            resultado,
        }))
    }

    fn snapshot_summary(
        &self,
        conn: &rusqlite::Connection,
        snapshot_id: &str,
    ) -> AppResult<SnapshotSummary> {
        let proyecto = match conn.query_row(
            "SELECT codigo, nombre, responsable_tecnico
             FROM datos_proyecto WHERE snapshot_id = ?1",
            params![snapshot_id],
            |row| {
                Ok(ProjectHeader {
                    codigo: row.get(0)?,
                    nombre: row.get(1)?,
                    responsable_tecnico: row.get(2)?,
                })
            },
        ) {
            Ok(header) => Some(header),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let etapas: i64 = conn.query_row(
            "SELECT COUNT(*) FROM datos_etapa WHERE snapshot_id = ?1",
            params![snapshot_id],
            |row| row.get(0),
        )?;

        let registros_avance: i64 = conn.query_row(
            "SELECT COUNT(*) FROM datos_avance WHERE snapshot_id = ?1",
            params![snapshot_id],
            |row| row.get(0),
        )?;

        let seguridad = match conn.query_row(
            "SELECT total_medidas_chequeadas, total_cumplen, cumple_todas, medidas_implementadas
             FROM datos_seguridad WHERE snapshot_id = ?1",
            params![snapshot_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        ) {
            Ok((total, cumplen, cumple_todas, medidas_raw)) => Some(SafetySummary {
                total_medidas_chequeadas: total,
                total_cumplen: cumplen,
                cumple_todas,
                medidas_implementadas: serde_json::from_str(&medidas_raw)
                    .unwrap_or(Value::Array(Vec::new())),
            }),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(SnapshotSummary {
            proyecto,
            etapas: etapas as usize,
            registros_avance: registros_avance as usize,
            seguridad,
        })
    }

    fn invocation_audit(
        &self,
        conn: &rusqlite::Connection,
        analysis_id: &str,
    ) -> AppResult<Vec<InvocationAudit>> {
        let mut stmt = conn.prepare(
            "SELECT modelo_usado, invocado_at, exitosa, duracion_ms,
                    tokens_prompt, tokens_respuesta, error_detalle
             FROM invocaciones WHERE analisis_id = ?1 ORDER BY invocado_at",
        )?;

        let entries = stmt
            .query_map(params![analysis_id], |row| {
                let tokens_prompt: Option<i64> = row.get(4)?;
                let tokens_respuesta: Option<i64> = row.get(5)?;
                Ok(InvocationAudit {
                    modelo: row.get(0)?,
                    invocado_at: row.get(1)?,
                    exitosa: row.get(2)?,
                    duracion_ms: row.get(3)?,
                    tokens: tokens_prompt.unwrap_or(0) + tokens_respuesta.unwrap_or(0),
                    error_detalle: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn result_view(
        &self,
        conn: &rusqlite::Connection,
        analysis_id: &str,
    ) -> AppResult<Option<ResultView>> {
        let result = match conn.query_row(
            "SELECT id, resumen_general, score_coherencia, detecta_riesgos
             FROM resultados WHERE analisis_id = ?1",
            params![analysis_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, bool>(3)?,
                ))
            },
        ) {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let (resultado_id, resumen_general, score_coherencia, detecta_riesgos) = result;

        let mut stmt = conn.prepare(
            "SELECT titulo, descripcion, nivel
             FROM observaciones WHERE resultado_id = ?1 ORDER BY id",
        )?;
        let observaciones = stmt
            .query_map(params![resultado_id], |row| {
                Ok(Observation {
                    titulo: row.get(0)?,
                    descripcion: row.get(1)?,
                    nivel: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ResultView {
            resumen_general,
            score_coherencia,
            detecta_riesgos,
            observaciones,
        }))
    }

    /// All analyses, oldest first
    pub fn list_analyses(&self) -> AppResult<Vec<Analysis>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, proyecto_codigo, estado, created_at FROM analisis ORDER BY created_at, id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, proyecto_codigo, estado_raw, created_at)| {
                let estado = AnalysisState::parse(&estado_raw).ok_or_else(|| {
                    AppError::parse(format!("unknown analysis state '{}'", estado_raw))
                })?;
                Ok(Analysis {
                    id,
                    proyecto_codigo,
                    estado,
                    created_at,
                })
            })
            .collect()
    }

    /// Stored verbatim payload of an analysis, for replay/audit
    pub fn get_snapshot_payload(&self, analysis_id: &str) -> AppResult<Option<Value>> {
        let conn = self.get_connection()?;
        match conn.query_row(
            "SELECT payload_completo FROM snapshots WHERE analisis_id = ?1",
            params![analysis_id],
            |row| row.get::<_, String>(0),
        ) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
