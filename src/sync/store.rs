//! Client-side mirror of the dashboard state.
//!
//! The store is an owned value; whoever drives the connection feeds it
//! frames and timer ticks. Statuses are always recomputed locally from the
//! shared threshold table rather than taken from the wire.

use super::SyncError;
use crate::domain::{
    AgricultureSnapshot, Alert, EnergySnapshot, IrrigationReport, IrrigationZone, Status,
    WaterSnapshot, WeatherForecastEntry,
};
use crate::realtime::protocol::{ClientMessage, DataKind, InitialPayload, ServerMessage, UpdatePayload};
use crate::simulation::events::seed_alerts;
use crate::simulation::thresholds::{
    agriculture_status_of, energy_status_of, reading, water_status_of,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

pub const CHART_POINTS: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
    pub unit: Option<&'static str>,
}

impl Metric {
    fn new(label: &'static str, value: &str, unit: Option<&'static str>) -> Self {
        Self {
            label,
            value: value.to_string(),
            unit,
        }
    }
}

/// What one dashboard tile shows
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCard {
    pub title: &'static str,
    pub status: Status,
    pub metrics: Vec<Metric>,
    pub chart: Vec<i64>,
}

impl StatusCard {
    pub fn summary(&self) -> String {
        let metrics: Vec<String> = self
            .metrics
            .iter()
            .map(|m| match m.unit {
                Some(unit) => format!("{} {}{}", m.label, m.value, unit),
                None => format!("{} {}", m.label, m.value),
            })
            .collect();
        format!("{} [{}] {}", self.title, self.status, metrics.join(", "))
    }
}

// `response` to an irrigation request carries the full report; older
// servers sent the bare zone list.
#[derive(Deserialize)]
#[serde(untagged)]
enum IrrigationData {
    Report(IrrigationReport),
    Zones(Vec<IrrigationZone>),
}

impl IrrigationData {
    fn into_zones(self) -> Vec<IrrigationZone> {
        match self {
            IrrigationData::Report(report) => report.zones,
            IrrigationData::Zones(zones) => zones,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardStore {
    energy: EnergySnapshot,
    water: WaterSnapshot,
    agriculture: AgricultureSnapshot,
    energy_chart: VecDeque<i64>,
    water_chart: VecDeque<i64>,
    agriculture_chart: VecDeque<i64>,
    alerts: Vec<Alert>,
    irrigation_zones: Vec<IrrigationZone>,
    weather_forecast: Vec<WeatherForecastEntry>,
    connected: bool,
    last_update: Option<DateTime<Utc>>,
    last_frame: Option<Value>,
}

fn zone(id: &str, name: &str, active: bool, duration: &str) -> IrrigationZone {
    IrrigationZone {
        id: id.to_string(),
        name: name.to_string(),
        active,
        duration: duration.to_string(),
    }
}

fn day(day: &str, icon: &str, temperature: &str) -> WeatherForecastEntry {
    WeatherForecastEntry {
        day: day.to_string(),
        icon: icon.to_string(),
        temperature: temperature.to_string(),
    }
}

impl Default for DashboardStore {
    /// The placeholder dashboard shown before the first frame arrives
    fn default() -> Self {
        let mut store = Self {
            energy: EnergySnapshot {
                solar: "3.4".to_string(),
                battery: "78".to_string(),
                grid: "5.2".to_string(),
                status: Status::Optimal,
                history: Vec::new(),
            },
            water: WaterSnapshot {
                reservoir: "68".to_string(),
                flow: "45".to_string(),
                quality: "92".to_string(),
                status: Status::Optimal,
                history: Vec::new(),
            },
            agriculture: AgricultureSnapshot {
                soil: "42".to_string(),
                temp: "27".to_string(),
                irrigation: "ON".to_string(),
                status: Status::Optimal,
                history: Vec::new(),
            },
            energy_chart: VecDeque::from([87, 62, 75, 50, 100, 87, 62]),
            water_chart: VecDeque::from([62, 50, 87, 75, 44, 56, 69]),
            agriculture_chart: VecDeque::from([50, 62, 44, 56, 75, 62, 50]),
            alerts: seed_alerts(),
            irrigation_zones: vec![
                zone("zone1", "North Field Zone", true, "15 min"),
                zone("zone2", "East Field Zone", false, "0 min"),
                zone("zone3", "South Field Zone", true, "8 min"),
            ],
            weather_forecast: vec![
                day("Mon", "fa-sun", "32°C"),
                day("Tue", "fa-cloud", "28°C"),
                day("Wed", "fa-cloud-rain", "25°C"),
                day("Thu", "fa-cloud-sun", "27°C"),
                day("Fri", "fa-sun", "30°C"),
            ],
            connected: false,
            last_update: None,
            last_frame: None,
        };
        store.energy.status = energy_status_of(&store.energy);
        store.water.status = water_status_of(&store.water);
        store.agriculture.status = agriculture_status_of(&store.agriculture);
        store
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn energy_card(&self) -> StatusCard {
        StatusCard {
            title: "Energy Status",
            status: self.energy.status,
            metrics: vec![
                Metric::new("Solar", &self.energy.solar, Some("kW")),
                Metric::new("Battery", &self.energy.battery, Some("%")),
                Metric::new("Grid", &self.energy.grid, Some("kW")),
            ],
            chart: self.energy_chart.iter().copied().collect(),
        }
    }

    pub fn water_card(&self) -> StatusCard {
        StatusCard {
            title: "Water Supply",
            status: self.water.status,
            metrics: vec![
                Metric::new("Reservoir", &self.water.reservoir, Some("%")),
                Metric::new("Flow Rate", &self.water.flow, Some("L/m")),
                Metric::new("Quality", &self.water.quality, Some("%")),
            ],
            chart: self.water_chart.iter().copied().collect(),
        }
    }

    pub fn agriculture_card(&self) -> StatusCard {
        StatusCard {
            title: "Smart Agriculture",
            status: self.agriculture.status,
            metrics: vec![
                Metric::new("Soil Moisture", &self.agriculture.soil, Some("%")),
                Metric::new("Temperature", &self.agriculture.temp, Some("°C")),
                Metric::new("Irrigation", &self.agriculture.irrigation, None),
            ],
            chart: self.agriculture_chart.iter().copied().collect(),
        }
    }

    pub fn energy(&self) -> &EnergySnapshot {
        &self.energy
    }

    pub fn water(&self) -> &WaterSnapshot {
        &self.water
    }

    pub fn agriculture(&self) -> &AgricultureSnapshot {
        &self.agriculture
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn irrigation_zones(&self) -> &[IrrigationZone] {
        &self.irrigation_zones
    }

    pub fn weather_forecast(&self) -> &[WeatherForecastEntry] {
        &self.weather_forecast
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn last_frame(&self) -> Option<&Value> {
        self.last_frame.as_ref()
    }

    fn set_energy(&mut self, mut energy: EnergySnapshot) {
        energy.status = energy_status_of(&energy);
        self.energy = energy;
    }

    fn set_water(&mut self, mut water: WaterSnapshot) {
        water.status = water_status_of(&water);
        self.water = water;
    }

    fn set_agriculture(&mut self, mut agriculture: AgricultureSnapshot) {
        agriculture.status = agriculture_status_of(&agriculture);
        self.agriculture = agriculture;
    }

    fn apply_initial(&mut self, data: InitialPayload) {
        if let Some(energy) = data.energy {
            self.set_energy(energy);
        }
        if let Some(water) = data.water {
            self.set_water(water);
        }
        if let Some(agriculture) = data.agriculture {
            self.set_agriculture(agriculture);
        }
        if let Some(alerts) = data.alerts {
            self.alerts = alerts;
        }
        if let Some(zones) = data.irrigation_zones {
            self.irrigation_zones = zones;
        }
        if let Some(forecast) = data.weather_forecast {
            self.weather_forecast = forecast;
        }
    }

    fn apply_update(&mut self, data: UpdatePayload) {
        if let Some(energy) = data.energy {
            self.set_energy(energy);
        }
        if let Some(water) = data.water {
            self.set_water(water);
        }
        if let Some(agriculture) = data.agriculture {
            self.set_agriculture(agriculture);
        }
    }

    fn apply_response(&mut self, data_type: &str, data: Value) -> Result<(), SyncError> {
        match DataKind::parse(data_type) {
            DataKind::Alerts => self.alerts = serde_json::from_value(data)?,
            DataKind::Irrigation => {
                self.irrigation_zones = serde_json::from_value::<IrrigationData>(data)?.into_zones()
            }
            DataKind::Weather => self.weather_forecast = serde_json::from_value(data)?,
            DataKind::Dashboard => debug!(data_type, "ignoring response for unrequested data"),
        }
        Ok(())
    }

    pub fn apply(&mut self, message: ServerMessage) -> Result<(), SyncError> {
        match message {
            ServerMessage::Initial { data } => self.apply_initial(data),
            ServerMessage::Update { data, .. } => self.apply_update(data),
            ServerMessage::Response {
                data_type, data, ..
            } => self.apply_response(&data_type, data)?,
        }
        self.last_update = Some(Utc::now());
        Ok(())
    }

    /// Decode and apply one text frame exactly as received
    pub fn apply_text(&mut self, text: &str) -> Result<(), SyncError> {
        let raw: Value = serde_json::from_str(text)?;
        let message: ServerMessage = serde_json::from_value(raw.clone())?;
        self.apply(message)?;
        self.last_frame = Some(raw);
        Ok(())
    }

    /// Drift the local readings while no server is feeding the store.
    /// Returns whether anything changed.
    pub fn perturb_offline<R: Rng>(&mut self, rng: &mut R) -> bool {
        if self.connected {
            return false;
        }

        let solar = reading(&self.energy.solar).unwrap_or_default() + rng.gen_range(-0.2..0.2);
        let grid = reading(&self.energy.grid).unwrap_or_default() + rng.gen_range(-0.1..0.1);
        let battery = step(&self.energy.battery, rng, 0, 100);
        self.energy.solar = format!("{:.1}", solar.max(0.0));
        self.energy.grid = format!("{:.1}", grid.max(0.0));
        self.energy.battery = battery.to_string();
        self.energy.status = energy_status_of(&self.energy);

        self.water.reservoir = step(&self.water.reservoir, rng, 0, 100).to_string();
        self.water.flow = step(&self.water.flow, rng, 20, 100).to_string();
        self.water.quality = step(&self.water.quality, rng, 70, 100).to_string();
        self.water.status = water_status_of(&self.water);

        true
    }

    /// Shift every chart left by one new sample
    pub fn roll_charts<R: Rng>(&mut self, rng: &mut R) {
        roll(&mut self.energy_chart, rng.gen_range(50..100));
        roll(&mut self.water_chart, rng.gen_range(30..80));
        roll(&mut self.agriculture_chart, rng.gen_range(40..80));
    }

    /// Build a `request_data` frame for the live connection
    pub fn request_refresh(&self, kind: DataKind) -> Result<ClientMessage, SyncError> {
        if !self.connected {
            return Err(SyncError::Disconnected);
        }
        Ok(ClientMessage::RequestData {
            data_type: kind.as_str().to_string(),
            request_id: Value::String(Uuid::new_v4().to_string()),
        })
    }

    /// Hide an alert locally; the server is not told
    pub fn dismiss_alert(&mut self, id: &str) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|alert| alert.id != id);
        self.alerts.len() != before
    }
}

// Integer reading nudged by -1, 0 or +1 and clamped
fn step<R: Rng>(value: &str, rng: &mut R, min: i64, max: i64) -> i64 {
    let current = reading(value).map(|v| v.trunc() as i64).unwrap_or(min);
    (current + rng.gen_range(-1..=1)).clamp(min, max)
}

fn roll(chart: &mut VecDeque<i64>, sample: i64) {
    chart.push_back(sample);
    while chart.len() > CHART_POINTS {
        chart.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn energy(battery: &str) -> Value {
        json!({"solar": "2.5", "battery": battery, "grid": "4.1", "status": "optimal"})
    }

    #[test]
    fn test_seeded_placeholders() {
        let store = DashboardStore::new();
        assert_eq!(store.energy().battery, "78");
        assert_eq!(store.alerts().len(), 3);
        assert_eq!(store.irrigation_zones().len(), 3);
        assert_eq!(store.weather_forecast()[0].day, "Mon");
        assert_eq!(store.energy_card().chart.len(), CHART_POINTS);
        assert!(!store.is_connected());
    }

    #[test]
    fn test_placeholder_statuses_follow_thresholds() {
        let store = DashboardStore::new();
        assert_eq!(store.energy().status, energy_status_of(store.energy()));
        assert_eq!(store.water().status, water_status_of(store.water()));
        assert_eq!(
            store.agriculture().status,
            agriculture_status_of(store.agriculture())
        );
        assert_eq!(store.water_card().status, Status::Optimal);
    }

    #[test]
    fn test_update_recomputes_status_and_keeps_lists() {
        let mut store = DashboardStore::new();
        let alerts = store.alerts().to_vec();
        let zones = store.irrigation_zones().to_vec();
        let forecast = store.weather_forecast().to_vec();
        let frame = json!({
            "type": "update",
            "timestamp": 1,
            "data": {"energy": energy("25")}
        });
        store.apply_text(&frame.to_string()).expect("valid update");

        assert_eq!(store.energy().battery, "25");
        assert_eq!(store.energy().status, Status::Critical);
        assert_eq!(store.alerts(), alerts.as_slice());
        assert_eq!(store.irrigation_zones(), zones.as_slice());
        assert_eq!(store.weather_forecast(), forecast.as_slice());
        assert_eq!(store.last_frame(), Some(&frame));
        assert!(store.last_update().is_some());
    }

    #[test]
    fn test_initial_replaces_present_keys_only() {
        let mut store = DashboardStore::new();
        let frame = json!({
            "type": "initial",
            "data": {
                "water": {"reservoir": "35", "flow": "40", "quality": "90", "status": "optimal"},
                "alerts": []
            }
        });
        store.apply_text(&frame.to_string()).expect("valid initial");

        assert_eq!(store.water().status, Status::Critical);
        assert!(store.alerts().is_empty());
        assert_eq!(store.energy().battery, "78");
        assert_eq!(store.weather_forecast().len(), 5);
    }

    #[test]
    fn test_irrigation_response_accepts_report_or_list() {
        let mut store = DashboardStore::new();
        let zones = json!([{"id": "zone9", "name": "West", "active": false, "duration": "0 min"}]);

        store
            .apply(ServerMessage::Response {
                request_id: json!("1"),
                data_type: "irrigation".to_string(),
                data: json!({"zones": zones, "recommendation": "Hold"}),
            })
            .expect("report decodes");
        assert_eq!(store.irrigation_zones()[0].id, "zone9");

        store
            .apply(ServerMessage::Response {
                request_id: json!("2"),
                data_type: "irrigation".to_string(),
                data: json!([]),
            })
            .expect("list decodes");
        assert!(store.irrigation_zones().is_empty());
    }

    #[test]
    fn test_bad_payload_is_decode_error() {
        let mut store = DashboardStore::new();
        let err = store
            .apply(ServerMessage::Response {
                request_id: Value::Null,
                data_type: "weather".to_string(),
                data: json!({"nope": true}),
            })
            .unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
        assert_eq!(store.weather_forecast().len(), 5);

        assert!(matches!(store.apply_text("not json"), Err(SyncError::Decode(_))));
    }

    #[test]
    fn test_unknown_response_is_ignored() {
        let mut store = DashboardStore::new();
        store
            .apply(ServerMessage::Response {
                request_id: Value::Null,
                data_type: "dashboard".to_string(),
                data: json!({"anything": 1}),
            })
            .expect("ignored");
        assert_eq!(store.alerts().len(), 3);
    }

    #[test]
    fn test_refresh_requires_connection() {
        let mut store = DashboardStore::new();
        assert!(matches!(
            store.request_refresh(DataKind::Alerts),
            Err(SyncError::Disconnected)
        ));

        store.set_connected(true);
        match store.request_refresh(DataKind::Weather) {
            Ok(ClientMessage::RequestData {
                data_type,
                request_id,
            }) => {
                assert_eq!(data_type, "weather");
                assert!(request_id.as_str().map(|s| !s.is_empty()).unwrap_or(false));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_offline_perturbation_stays_in_bounds() {
        let mut store = DashboardStore::new();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            assert!(store.perturb_offline(&mut rng));
            let reservoir = reading(&store.water().reservoir).expect("numeric");
            let flow = reading(&store.water().flow).expect("numeric");
            let quality = reading(&store.water().quality).expect("numeric");
            let battery = reading(&store.energy().battery).expect("numeric");
            assert!((0.0..=100.0).contains(&reservoir));
            assert!((20.0..=100.0).contains(&flow));
            assert!((70.0..=100.0).contains(&quality));
            assert!((0.0..=100.0).contains(&battery));
            assert_eq!(store.energy().status, energy_status_of(store.energy()));
        }
    }

    #[test]
    fn test_offline_drift_never_goes_negative() {
        let mut store = DashboardStore::new();
        let frame = json!({
            "type": "update",
            "timestamp": 1,
            "data": {"energy": {"solar": "0.0", "battery": "60", "grid": "0.0", "status": "optimal"}}
        });
        store.apply_text(&frame.to_string()).expect("valid update");

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            store.perturb_offline(&mut rng);
            for value in [&store.energy().solar, &store.energy().grid] {
                assert!(!value.starts_with('-'), "negative reading {}", value);
                assert!(reading(value).expect("numeric") >= 0.0);
            }
        }
    }

    #[test]
    fn test_no_perturbation_while_connected() {
        let mut store = DashboardStore::new();
        store.set_connected(true);
        let before = store.energy().clone();
        assert!(!store.perturb_offline(&mut StdRng::seed_from_u64(1)));
        assert_eq!(store.energy(), &before);
    }

    #[test]
    fn test_roll_charts_keeps_seven_points() {
        let mut store = DashboardStore::new();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            store.roll_charts(&mut rng);
        }
        for card in [store.energy_card(), store.water_card(), store.agriculture_card()] {
            assert_eq!(card.chart.len(), CHART_POINTS);
        }
        assert!(store.energy_card().chart.iter().all(|v| (50..100).contains(v)));
        assert!(store.agriculture_card().chart.iter().all(|v| (40..80).contains(v)));
    }

    #[test]
    fn test_dismiss_alert_is_local() {
        let mut store = DashboardStore::new();
        assert!(store.dismiss_alert("2"));
        assert!(!store.dismiss_alert("2"));
        assert_eq!(store.alerts().len(), 2);
    }
}
