//! Local stand-ins for the ML and market service, tagged `source: "simulation"`.

use super::{instant, Simulator};
use rand::Rng;
use serde_json::{json, Value};

pub const SIMULATION_SOURCE: &str = "simulation";

const HOUR_MS: i64 = 60 * 60 * 1000;
const TARGET_MOISTURE: f64 = 50.0;
const LEAK_HIGH_USAGE: f64 = 90.0;
const LEAK_LOW_USAGE: f64 = 10.0;

/// Usage outside the normal band is treated as a probable leak
pub fn is_abnormal_usage(water_usage: f64) -> bool {
    water_usage > LEAK_HIGH_USAGE || water_usage < LEAK_LOW_USAGE
}

fn solar_output(solar: &str) -> f64 {
    solar.parse().unwrap_or_default()
}

impl<R: Rng> Simulator<R> {
    /// Hourly solar output for the next 24 hours
    pub fn energy_forecast(&mut self, timestamp_ms: i64) -> Value {
        let hourly: Vec<Value> = (0..24)
            .map(|i| {
                let at_ms = timestamp_ms.saturating_add(i * HOUR_MS);
                let energy = self.energy(at_ms);
                json!({
                    "time": instant(at_ms).format("%H:%M").to_string(),
                    "output": solar_output(&energy.solar),
                    "timestamp": at_ms,
                })
            })
            .collect();

        json!({
            "success": true,
            "forecast": hourly,
            "source": SIMULATION_SOURCE,
        })
    }

    pub fn energy_prediction(&mut self, timestamp_ms: i64) -> Value {
        let energy = self.energy(timestamp_ms);
        json!({
            "success": true,
            "prediction": {
                "solar_output": solar_output(&energy.solar),
                "timestamp": instant(timestamp_ms).to_rfc3339(),
            },
            "source": SIMULATION_SOURCE,
        })
    }

    pub fn leak_detection(&mut self, water_usage: f64) -> Value {
        let abnormal = is_abnormal_usage(water_usage);
        let (confidence, severity, recommendation) = if abnormal {
            let confidence = self.rng.gen_range(70..100);
            let severity = if confidence > 80 { "high" } else { "medium" };
            (
                confidence,
                severity,
                "Investigate unusual water usage patterns",
            )
        } else {
            (100 - self.rng.gen_range(0..20), "none", "No action needed")
        };
        let anomaly_score = if abnormal { -0.5 } else { 0.5 };

        json!({
            "success": true,
            "result": {
                "leak_detected": abnormal,
                "confidence": confidence,
                "severity": severity,
                "recommendation": recommendation,
                "anomaly_details": {
                    "is_anomaly": abnormal,
                    "anomaly_score": anomaly_score,
                    "water_usage": water_usage,
                },
            },
            "source": SIMULATION_SOURCE,
        })
    }

    pub fn irrigation_plan(&mut self, soil_moisture: f64, temperature: f64, timestamp_ms: i64) -> Value {
        let expected = (soil_moisture + 30.0).round().min(95.0);

        let mut advice = vec![
            format!(
                "Optimal irrigation time: {} minutes to reach target soil moisture.",
                (30.0 - soil_moisture / 2.0).round()
            ),
            format!("Expected soil moisture after irrigation: {}%.", expected),
        ];
        if temperature > 30.0 {
            advice.push(
                "High temperature detected. Consider irrigating during early morning or evening for better efficiency."
                    .to_string(),
            );
        }

        json!({
            "success": true,
            "result": {
                "zones": self.irrigation(timestamp_ms),
                "recommendation": advice.join(" "),
                "moisture_deficit": (TARGET_MOISTURE - soil_moisture).round(),
                "current_moisture": soil_moisture,
                "target_moisture": TARGET_MOISTURE,
                "expected_moisture": expected,
            },
            "source": SIMULATION_SOURCE,
        })
    }

    pub fn market_stats(&mut self) -> Value {
        let traded = self.between(500.0, 1500.0).round();
        let value = self.between(1000.0, 6000.0).round() / 100.0;
        let price = self.between(0.1, 0.3);

        json!({
            "success": true,
            "stats": {
                "total_energy_traded": traded,
                "total_value_traded": value,
                "transaction_count": self.rng.gen_range(10..60),
                "average_price": format!("{:.4}", price),
                "active_users": self.rng.gen_range(5..15),
                "pending_transactions": self.rng.gen_range(0..3),
            },
            "source": SIMULATION_SOURCE,
        })
    }
}
