//! HTTP Routes
//!
//! Thin warp layer over the analysis service: snapshot intake, detail
//! lookup and a health probe under `/api/v1`. All business behavior lives
//! in the services; handlers only translate results to HTTP.

use std::convert::Infallible;
use std::sync::Arc;

use serde_json::json;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::models::snapshot::SnapshotRequest;
use crate::state::AppState;
use crate::utils::error::AppError;

/// All service routes
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let iniciar = warp::path!("api" / "v1" / "analisis" / "iniciar")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(Arc::clone(&state)))
        .and_then(iniciar_analisis);

    let detalle = warp::path!("api" / "v1" / "analisis" / "detalle" / String)
        .and(warp::get())
        .and(with_state(Arc::clone(&state)))
        .and_then(obtener_detalle);

    let health = warp::path!("api" / "v1" / "health")
        .and(warp::get())
        .and(with_state(state))
        .and_then(health_check);

    iniciar.or(detalle).or(health)
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

/// `POST /api/v1/analisis/iniciar`
async fn iniciar_analisis(
    request: SnapshotRequest,
    state: Arc<AppState>,
) -> Result<impl Reply, Infallible> {
    match state.analysis.start_analysis(request).await {
        Ok(started) => Ok(json_reply(
            StatusCode::OK,
            &json!({
                "analisis_id": started.analisis_id,
                "resultado": started.resultado,
            }),
        )),
        Err(e) => Ok(error_reply(&e)),
    }
}

/// `GET /api/v1/analisis/detalle/{id}`
async fn obtener_detalle(
    analysis_id: String,
    state: Arc<AppState>,
) -> Result<impl Reply, Infallible> {
    match state.analysis.detail(&analysis_id) {
        Ok(detail) => Ok(json_reply(StatusCode::OK, &json!(detail))),
        Err(e) => Ok(error_reply(&e)),
    }
}

/// `GET /api/v1/health`
async fn health_check(state: Arc<AppState>) -> Result<impl Reply, Infallible> {
    let database_up = state.db.ping();
    let status = if database_up { "healthy" } else { "unhealthy" };
    Ok(json_reply(
        StatusCode::OK,
        &json!({
            "status": status,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
            "components": {
                "api": "up",
                "database": if database_up { "up" } else { "down" },
            }
        }),
    ))
}

fn json_reply(status: StatusCode, body: &serde_json::Value) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn error_reply(err: &AppError) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_reply(status, &json!({ "detail": err.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::{LlmResult, ModelClient};
    use crate::services::webhook::WebhookClient;
    use crate::storage::database::Database;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Canned(Value);

    #[async_trait]
    impl ModelClient for Canned {
        fn model(&self) -> &str {
            "test-model"
        }

        async fn send_prompt(&self, _system: &str, _user: &str) -> LlmResult<Value> {
            Ok(self.0.clone())
        }
    }

    fn test_state(reply: Value) -> Arc<AppState> {
        Arc::new(AppState::with_parts(
            Arc::new(Database::new_in_memory().unwrap()),
            Arc::new(Canned(reply)),
            Arc::new(WebhookClient::new(None)),
        ))
    }

    fn ok_envelope() -> Value {
        json!({
            "choices": [{"message": {"content": "{\"resumen\":\"ok\",\"score_coherencia\":90,\"riesgos\":[]}"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        })
    }

    #[tokio::test]
    async fn test_iniciar_returns_id_and_result() {
        let state = test_state(ok_envelope());
        let response = warp::test::request()
            .method("POST")
            .path("/api/v1/analisis/iniciar")
            .json(&json!({"proyecto_codigo": "OB-1", "datos": {"etapas": []}}))
            .reply(&routes(state))
            .await;

        assert_eq!(response.status(), 200);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["analisis_id"].is_string());
        assert_eq!(body["resultado"]["resumen"], "ok");
    }

    #[tokio::test]
    async fn test_model_failure_maps_to_server_error() {
        // Envelope without "choices"
        let state = test_state(json!({"error": "boom"}));
        let response = warp::test::request()
            .method("POST")
            .path("/api/v1/analisis/iniciar")
            .json(&json!({"proyecto_codigo": "OB-1", "datos": {}}))
            .reply(&routes(state))
            .await;

        assert_eq!(response.status(), 500);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["detail"].as_str().unwrap().contains("choices"));
    }

    #[tokio::test]
    async fn test_detalle_unknown_id_is_404() {
        let state = test_state(ok_envelope());
        let response = warp::test::request()
            .method("GET")
            .path("/api/v1/analisis/detalle/desconocido")
            .reply(&routes(state))
            .await;

        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_detalle_round_trip() {
        let state = test_state(ok_envelope());
        let filter = routes(Arc::clone(&state));

        let created = warp::test::request()
            .method("POST")
            .path("/api/v1/analisis/iniciar")
            .json(&json!({"proyecto_codigo": "OB-1", "datos": {}}))
            .reply(&filter)
            .await;
        let created: Value = serde_json::from_slice(created.body()).unwrap();
        let id = created["analisis_id"].as_str().unwrap();

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/api/v1/analisis/detalle/{}", id))
            .reply(&filter)
            .await;

        assert_eq!(response.status(), 200);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["estado"], "COMPLETADO");
        assert_eq!(body["proyecto_codigo"], "OB-1");
    }

    #[tokio::test]
    async fn test_health_reports_database_up() {
        let state = test_state(ok_envelope());
        let response = warp::test::request()
            .method("GET")
            .path("/api/v1/health")
            .reply(&routes(state))
            .await;

        assert_eq!(response.status(), 200);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["database"], "up");
    }
}
