/// HTTP request handlers
use crate::clients::MlClient;
use crate::config::AppConfig;
use crate::domain::{
    AgricultureSnapshot, Alert, ChatReply, ChatRequest, DashboardSnapshot, EnergyPredictRequest,
    EnergySnapshot, Health, IrrigationOptimizationRequest, IrrigationReport, LeakDetectionRequest,
    WaterSnapshot, WeatherForecastEntry,
};
use crate::errors::{ApiError, ApiResult};
use crate::realtime::Hub;
use crate::services::{MlService, SimulationService};
use crate::simulation::{now_ms, Simulator};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub simulation: Arc<SimulationService>,
    pub ml: Arc<MlService>,
    pub hub: Hub,
}

impl AppState {
    pub fn new(config: &AppConfig, simulator: Simulator) -> ApiResult<Self> {
        let simulation = Arc::new(SimulationService::new(simulator));
        let client = MlClient::new(
            config.ml_api_url.clone(),
            Duration::from_secs(config.upstream_timeout_seconds),
        )?;
        let ml = Arc::new(MlService::new(client, Arc::clone(&simulation)));

        Ok(Self {
            simulation,
            ml,
            hub: Hub::new(config.realtime.queue_capacity),
        })
    }
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.simulation.dashboard(now_ms()))
}

pub async fn get_energy(State(state): State<AppState>) -> Json<EnergySnapshot> {
    Json(state.simulation.with(|sim| sim.energy(now_ms())))
}

pub async fn get_water(State(state): State<AppState>) -> Json<WaterSnapshot> {
    Json(state.simulation.with(|sim| sim.water(now_ms())))
}

pub async fn get_agriculture(State(state): State<AppState>) -> Json<AgricultureSnapshot> {
    Json(state.simulation.with(|sim| sim.agriculture(now_ms())))
}

pub async fn get_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.simulation.alerts(now_ms()))
}

pub async fn get_irrigation(State(state): State<AppState>) -> Json<IrrigationReport> {
    Json(state.simulation.irrigation(now_ms()))
}

pub async fn get_weather(State(state): State<AppState>) -> Json<Vec<WeatherForecastEntry>> {
    Json(state.simulation.weather_forecast(now_ms()))
}

/// Answer a question from the dashboard assistant
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    let Json(req) = body?;
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidInput("Message is required".to_string()))?;
    debug!(turns = req.history.len(), "assistant question received");

    Ok(Json(state.simulation.chat(&message)))
}

pub async fn predict_energy(
    State(state): State<AppState>,
    body: Result<Json<EnergyPredictRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    Ok(Json(state.ml.predict_energy(req).await?))
}

pub async fn detect_leak(
    State(state): State<AppState>,
    body: Result<Json<LeakDetectionRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    Ok(Json(state.ml.detect_leak(req).await?))
}

pub async fn optimize_irrigation(
    State(state): State<AppState>,
    body: Result<Json<IrrigationOptimizationRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    Ok(Json(state.ml.optimize_irrigation(req).await?))
}

/// Energy market statistics from the ledger service
pub async fn get_energy_market(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(state.ml.energy_market().await?))
}
