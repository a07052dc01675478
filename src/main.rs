//! Runhub Server - Binary Entry Point

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use runhub::api::http::create_router;
use runhub::api::ws::{spawn_metrics_publisher, AppState, EventBus};
use runhub::config::ServerConfig;
use runhub::error::Result;
use runhub::supervisor::Supervisor;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = std::env::var("RUNHUB_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let mut config = ServerConfig::with_data_dir(data_dir);
    if let Ok(addr) = std::env::var("RUNHUB_BIND") {
        config.bind_addr = addr;
    }
    if let Ok(interpreter) = std::env::var("RUNHUB_INTERPRETER") {
        config.interpreter = interpreter;
    }

    let bind_addr = config.bind_addr.clone();
    let bus = Arc::new(EventBus::new());
    let supervisor = Supervisor::load(config, bus)?;

    // Boot-time reconciliation: bring every unit whose durable intent is
    // `running` back up before accepting commands.
    let report = supervisor.reconcile_intended_state().await;
    info!(
        should_be_running = report.should_be_running,
        succeeded = report.succeeded,
        already_running = report.already_running,
        failed = report.failed.len(),
        "boot reconciliation complete"
    );

    let _metrics = spawn_metrics_publisher(Arc::clone(&supervisor));

    let state = Arc::new(AppState::new(supervisor));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "runhub server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
