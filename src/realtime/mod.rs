//! Push distribution of simulated telemetry to dashboard clients.

pub mod hub;
pub mod protocol;
pub mod socket;

pub use hub::{BroadcastReport, Frame, Hub, Subscription};

use crate::errors::ApiResult;
use crate::services::SimulationService;
use crate::simulation::now_ms;
use protocol::{ClientMessage, DataKind, InitialPayload, ServerMessage, UpdatePayload};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub fn encode(message: &ServerMessage) -> ApiResult<Frame> {
    Ok(Arc::from(serde_json::to_string(message)?))
}

/// Everything a freshly connected dashboard needs
pub fn initial_message(simulation: &SimulationService, timestamp_ms: i64) -> ServerMessage {
    let data = simulation.with(|sim| InitialPayload {
        energy: Some(sim.energy(timestamp_ms)),
        water: Some(sim.water(timestamp_ms)),
        agriculture: Some(sim.agriculture(timestamp_ms)),
        alerts: Some(sim.alerts(timestamp_ms)),
        irrigation_zones: Some(sim.irrigation(timestamp_ms).zones),
        weather_forecast: Some(sim.weather_forecast(timestamp_ms)),
    });
    ServerMessage::Initial { data }
}

/// Energy, water and agriculture only; the rest is pull-only
pub fn update_message(simulation: &SimulationService, timestamp_ms: i64) -> ServerMessage {
    let data = simulation.with(|sim| UpdatePayload {
        energy: Some(sim.energy(timestamp_ms)),
        water: Some(sim.water(timestamp_ms)),
        agriculture: Some(sim.agriculture(timestamp_ms)),
    });
    ServerMessage::Update {
        timestamp: timestamp_ms,
        data,
    }
}

/// Answer an on-demand request; `data_type` and `request_id` are echoed as sent
pub fn respond(
    simulation: &SimulationService,
    data_type: String,
    request_id: Value,
    timestamp_ms: i64,
) -> ApiResult<ServerMessage> {
    let data = match DataKind::parse(&data_type) {
        DataKind::Alerts => serde_json::to_value(simulation.alerts(timestamp_ms))?,
        DataKind::Irrigation => serde_json::to_value(simulation.irrigation(timestamp_ms))?,
        DataKind::Weather => serde_json::to_value(simulation.weather_forecast(timestamp_ms))?,
        DataKind::Dashboard => serde_json::to_value(simulation.dashboard(timestamp_ms))?,
    };

    Ok(ServerMessage::Response {
        request_id,
        data_type,
        data,
    })
}

/// Handle one inbound text frame. Malformed input is logged and ignored.
pub fn handle_client_text(simulation: &SimulationService, text: &str) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "ignoring malformed client frame");
            return None;
        }
    };

    match message {
        ClientMessage::RequestData {
            data_type,
            request_id,
        } => {
            debug!(data_type = %data_type, request_id = %request_id, "data requested");
            match respond(simulation, data_type, request_id, now_ms()) {
                Ok(reply) => Some(reply),
                Err(e) => {
                    error!(error = %e, "failed to build response");
                    None
                }
            }
        }
        ClientMessage::Other => {
            debug!("ignoring client frame of unknown type");
            None
        }
    }
}

/// Shared timer pushing partial snapshots to every open connection
pub async fn run_broadcaster(hub: Hub, simulation: Arc<SimulationService>, period: Duration) {
    info!("Starting telemetry broadcast (interval: {:?})", period);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if hub.connection_count() == 0 {
            continue;
        }

        match encode(&update_message(&simulation, now_ms())) {
            Ok(frame) => {
                let report = hub.broadcast(frame);
                debug!(
                    delivered = report.delivered,
                    dropped = report.dropped,
                    closed = report.closed,
                    "telemetry update broadcast"
                );
            }
            Err(e) => error!(error = %e, "failed to encode telemetry update"),
        }
    }
}
