/// Domain models for the application
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative health of a monitored domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Optimal,
    Attention,
    Critical,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Optimal => "optimal",
            Status::Attention => "attention",
            Status::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// One sparkline sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub time: String,
    pub value: i64,
}

/// Energy readings; numeric fields are pre-formatted for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySnapshot {
    pub solar: String,
    pub battery: String,
    pub grid: String,
    pub status: Status,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSnapshot {
    pub reservoir: String,
    pub flow: String,
    pub quality: String,
    pub status: Status,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgricultureSnapshot {
    pub soil: String,
    pub temp: String,
    pub irrigation: String,
    pub status: Status,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecastEntry {
    pub day: String,
    pub icon: String,
    pub temperature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Danger,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub location: String,
    pub time: String,
    pub icon: String,
    pub primary_action: String,
    pub secondary_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationZone {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub duration: String,
}

/// Zone states plus the advisory shown next to them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationReport {
    pub zones: Vec<IrrigationZone>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub energy: String,
    pub water: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub energy: EnergySnapshot,
    pub water: WaterSnapshot,
    pub agriculture: AgricultureSnapshot,
    pub insights: Insights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Assistant,
}

/// A single entry of the assistant conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: ChatSender,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: i64,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}

/// Body of `POST /api/chat`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EnergyPredictRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LeakDetectionRequest {
    pub water_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IrrigationOptimizationRequest {
    pub soil_moisture: Option<f64>,
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
}
