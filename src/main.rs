use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use taskflow_server::app_env::AppConfig;
use taskflow_server::external_connections::ExternalConnectivity;
use taskflow_server::{SharedData, build_router, logging};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    let config = AppConfig::from_env().context("reading configuration")?;

    let otel_exporters = match config.otel {
        Some(ref endpoints) => Some(logging::init_exporters(&endpoints.spans, &endpoints.metrics)?),
        None => None,
    };
    let meter_provider = otel_exporters.as_ref().map(|exporters| exporters.meter.clone());
    logging::setup_logging_and_tracing(config.debug, logging::init_env_filter()?, otel_exporters)?;

    let ext_cxn = ExternalConnectivity::from_config(&config)?;
    let shared_data = Arc::new(SharedData::new(ext_cxn, config.demo_code_fallback));
    let router = build_router(shared_data);

    let listener = TcpListener::bind(("0.0.0.0", config.listen_port))
        .await
        .with_context(|| format!("binding port {}", config.listen_port))?;
    info!("Starting server on port {}", config.listen_port);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    if let Some(meter_provider) = meter_provider {
        if let Err(shutdown_err) = meter_provider.shutdown() {
            warn!("Failed to flush metrics: {shutdown_err}");
        }
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(signal_err) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {signal_err}");
        std::future::pending::<()>().await;
    }
}
