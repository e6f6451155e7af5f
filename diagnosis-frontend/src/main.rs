use diagnosis_frontend::config::{get_configuration, CREDENTIAL_ENV_VAR};
use diagnosis_frontend::services::agents::{DiagnosticAgent, GeminiAgent};
use diagnosis_frontend::startup::build_router;
use diagnosis_frontend::AppState;
use dotenvy::dotenv;
use service_core::observability::{init_tracing, install_prometheus_recorder};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("diagnosis-frontend", &configuration.telemetry)?;

    let metrics_handle = install_prometheus_recorder()?;

    let agent = GeminiAgent::new(configuration.gemini.clone())?;
    if agent.is_configured() {
        info!(
            model = %configuration.gemini.model,
            web_search = configuration.gemini.web_search,
            "Initialized Gemini agent"
        );
    } else {
        tracing::warn!(
            "{} is not set; every analysis will report a missing credential",
            CREDENTIAL_ENV_VAR
        );
    }

    let state = AppState::new(Arc::new(agent), configuration.ingestion.max_width)
        .with_metrics(metrics_handle);
    let app = build_router(state, &configuration.server);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting diagnosis-frontend on {}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })?;

    Ok(())
}
