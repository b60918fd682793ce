//! JSON frames exchanged over `/ws`.
//!
//! Server frames are tagged by `type` (`initial`, `update`, `response`);
//! the only client frame with meaning is `request_data`.

use crate::domain::{
    AgricultureSnapshot, Alert, EnergySnapshot, IrrigationZone, WaterSnapshot,
    WeatherForecastEntry,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Full dashboard state sent once when a connection opens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water: Option<WaterSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agriculture: Option<AgricultureSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Alert>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irrigation_zones: Option<Vec<IrrigationZone>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_forecast: Option<Vec<WeatherForecastEntry>>,
}

/// Periodic partial snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water: Option<WaterSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agriculture: Option<AgricultureSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Initial {
        data: InitialPayload,
    },
    Update {
        timestamp: i64,
        data: UpdatePayload,
    },
    Response {
        #[serde(rename = "requestId", default)]
        request_id: Value,
        #[serde(rename = "dataType")]
        data_type: String,
        data: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    RequestData {
        #[serde(rename = "dataType", default)]
        data_type: String,
        /// Opaque correlation token, echoed back untouched
        #[serde(rename = "requestId", default)]
        request_id: Value,
    },
    #[serde(other)]
    Other,
}

/// What a `request_data` frame asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Alerts,
    Irrigation,
    Weather,
    /// Anything unrecognised gets the dashboard snapshot
    Dashboard,
}

impl DataKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "alerts" => DataKind::Alerts,
            "irrigation" => DataKind::Irrigation,
            "weather" => DataKind::Weather,
            _ => DataKind::Dashboard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Alerts => "alerts",
            DataKind::Irrigation => "irrigation",
            DataKind::Weather => "weather",
            DataKind::Dashboard => "dashboard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_data_parses_with_string_id() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"request_data","dataType":"alerts","requestId":"abc"}"#,
        )
        .expect("valid frame");
        assert_eq!(
            msg,
            ClientMessage::RequestData {
                data_type: "alerts".to_string(),
                request_id: json!("abc"),
            }
        );
    }

    #[test]
    fn test_unknown_client_type_is_other() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"ping","at":1}"#).expect("tagged frame");
        assert_eq!(msg, ClientMessage::Other);
    }

    #[test]
    fn test_response_wire_names() {
        let frame = ServerMessage::Response {
            request_id: json!(17),
            data_type: "weather".to_string(),
            data: json!([]),
        };
        let value = serde_json::to_value(&frame).expect("serializable");
        assert_eq!(
            value,
            json!({"type": "response", "requestId": 17, "dataType": "weather", "data": []})
        );
    }

    #[test]
    fn test_initial_omits_missing_domains() {
        let frame = ServerMessage::Initial {
            data: InitialPayload::default(),
        };
        let value = serde_json::to_value(&frame).expect("serializable");
        assert_eq!(value, json!({"type": "initial", "data": {}}));
    }

    #[test]
    fn test_unrecognised_data_kind_means_dashboard() {
        assert_eq!(DataKind::parse("alerts"), DataKind::Alerts);
        assert_eq!(DataKind::parse("everything"), DataKind::Dashboard);
        assert_eq!(DataKind::Weather.as_str(), "weather");
    }
}
