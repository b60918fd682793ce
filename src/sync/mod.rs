/// Client synchronizer: keeps a local dashboard in step with the server
pub mod client;
pub mod store;

pub use client::DashboardClient;
pub use store::{DashboardStore, Metric, StatusCard};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to decode server frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not connected to the telemetry server")]
    Disconnected,

    #[error("WebSocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}
