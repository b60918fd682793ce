/// Telemetry server entry point
use rural_monitor::config::AppConfig;
use rural_monitor::handlers::AppState;
use rural_monitor::realtime::run_broadcaster;
use rural_monitor::routes::build_router;
use rural_monitor::simulation::Simulator;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    let state = AppState::new(&config, Simulator::from_entropy())?;

    start_background_tasks(&config, &state);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("rural-monitor listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Start the shared telemetry broadcast
fn start_background_tasks(config: &AppConfig, state: &AppState) {
    let hub = state.hub.clone();
    let simulation = state.simulation.clone();
    let period = config.update_interval();
    tokio::spawn(run_broadcaster(hub, simulation, period));

    info!("All background tasks started successfully");
}
