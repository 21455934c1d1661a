//! Obra Audit Service - Entry Point

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use obra_audit::{api, AppState, Settings};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let state = match AppState::new(&settings) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize application state");
            std::process::exit(1);
        }
    };

    tracing::info!(
        addr = %settings.bind_addr,
        db = %settings.database_path.display(),
        modelo = %settings.llm_model,
        "obra-audit listening"
    );
    warp::serve(api::routes(state)).run(settings.bind_addr).await;
}
