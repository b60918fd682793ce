/// Business logic services layer
use crate::clients::MlClient;
use crate::domain::{
    Alert, ChatReply, DashboardSnapshot, EnergyPredictRequest, IrrigationOptimizationRequest,
    IrrigationReport, LeakDetectionRequest, WeatherForecastEntry,
};
use crate::errors::{ApiError, ApiResult};
use crate::simulation::{now_ms, Simulator};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// Telemetry generation backed by one shared random source
pub struct SimulationService {
    simulator: Mutex<Simulator>,
}

impl SimulationService {
    pub fn new(simulator: Simulator) -> Self {
        Self {
            simulator: Mutex::new(simulator),
        }
    }

    /// Run `f` against the generator. A panic in an earlier caller leaves the
    /// RNG usable, so a poisoned lock is recovered rather than reported.
    pub fn with<T>(&self, f: impl FnOnce(&mut Simulator) -> T) -> T {
        let mut simulator = self
            .simulator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut *simulator)
    }

    pub fn dashboard(&self, timestamp_ms: i64) -> DashboardSnapshot {
        self.with(|sim| sim.dashboard(timestamp_ms))
    }

    pub fn alerts(&self, timestamp_ms: i64) -> Vec<Alert> {
        self.with(|sim| sim.alerts(timestamp_ms))
    }

    pub fn irrigation(&self, timestamp_ms: i64) -> IrrigationReport {
        self.with(|sim| sim.irrigation(timestamp_ms))
    }

    pub fn weather_forecast(&self, timestamp_ms: i64) -> Vec<WeatherForecastEntry> {
        self.with(|sim| sim.weather_forecast(timestamp_ms))
    }

    pub fn chat(&self, message: &str) -> ChatReply {
        self.with(|sim| sim.reply(message, now_ms()))
    }
}

fn requested_at(timestamp: &Option<Value>) -> i64 {
    timestamp
        .as_ref()
        .and_then(Value::as_i64)
        .unwrap_or_else(now_ms)
}

/// ML predictions with a local simulation standing in when the service is down
pub struct MlService {
    client: MlClient,
    simulation: Arc<SimulationService>,
}

impl MlService {
    pub fn new(client: MlClient, simulation: Arc<SimulationService>) -> Self {
        Self { client, simulation }
    }

    fn fallback(&self, what: &str, err: &ApiError) {
        warn!(
            upstream = self.client.base_url(),
            error = %err,
            "{} unavailable, using simulation fallback",
            what
        );
    }

    pub async fn predict_energy(&self, req: EnergyPredictRequest) -> ApiResult<Value> {
        match self.client.predict_energy(&req).await {
            Ok(data) => Ok(data),
            Err(e) => {
                self.fallback("ML API", &e);
                let at = requested_at(&req.timestamp);
                Ok(if req.forecast.unwrap_or(false) {
                    self.simulation.with(|sim| sim.energy_forecast(at))
                } else {
                    self.simulation.with(|sim| sim.energy_prediction(at))
                })
            }
        }
    }

    pub async fn detect_leak(&self, req: LeakDetectionRequest) -> ApiResult<Value> {
        let water_usage = req.water_usage.ok_or_else(|| {
            ApiError::InvalidInput("water_usage parameter is required".to_string())
        })?;

        match self.client.detect_leak(&req).await {
            Ok(data) => Ok(data),
            Err(e) => {
                self.fallback("ML API", &e);
                Ok(self.simulation.with(|sim| sim.leak_detection(water_usage)))
            }
        }
    }

    pub async fn optimize_irrigation(&self, req: IrrigationOptimizationRequest) -> ApiResult<Value> {
        let (soil, temperature) = match (req.soil_moisture, req.temperature) {
            (Some(soil), Some(temperature)) => (soil, temperature),
            _ => {
                return Err(ApiError::InvalidInput(
                    "soil_moisture and temperature parameters are required".to_string(),
                ))
            }
        };

        match self.client.optimize_irrigation(&req).await {
            Ok(data) => Ok(data),
            Err(e) => {
                self.fallback("ML API", &e);
                let at = requested_at(&req.timestamp);
                Ok(self
                    .simulation
                    .with(|sim| sim.irrigation_plan(soil, temperature, at)))
            }
        }
    }

    pub async fn energy_market(&self) -> ApiResult<Value> {
        match self.client.market_stats().await {
            Ok(data) => Ok(data),
            Err(e) => {
                self.fallback("Blockchain API", &e);
                Ok(self.simulation.with(|sim| sim.market_stats()))
            }
        }
    }
}
