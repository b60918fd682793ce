/// Headless dashboard that mirrors the telemetry server into the log
use rural_monitor::config::ClientConfig;
use rural_monitor::sync::DashboardClient;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config = ClientConfig::from_env()?;
    info!("dashboard client targeting {}", config.ws_url);

    DashboardClient::new(config).run().await
}
