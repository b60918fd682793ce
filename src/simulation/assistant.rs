//! Keyword-driven assistant replies built from fresh snapshots.

use super::Simulator;
use crate::domain::{ChatReply, Status};
use rand::Rng;

const DEFAULT_REPLY: &str =
    "I'm analyzing the data now. Is there anything specific you'd like to know about?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Water,
    Energy,
    Agriculture,
    Weather,
    System,
}

fn topic(message: &str) -> Option<Topic> {
    let has = |words: &[&str]| words.iter().any(|w| message.contains(w));

    if has(&["water", "leak", "flow"]) {
        Some(Topic::Water)
    } else if has(&["energy", "power", "solar", "battery"]) {
        Some(Topic::Energy)
    } else if has(&["agriculture", "irrigation", "farm", "soil"]) {
        Some(Topic::Agriculture)
    } else if has(&["weather", "forecast", "temperature"]) {
        Some(Topic::Weather)
    } else if has(&["system", "overall", "status"]) {
        Some(Topic::System)
    } else {
        None
    }
}

fn sky(icon: &str) -> &'static str {
    if icon.contains("sun") {
        "sunny"
    } else if icon.contains("rain") {
        "rainy"
    } else {
        "cloudy"
    }
}

impl<R: Rng> Simulator<R> {
    /// Answer a chat message; conversation history does not influence the reply
    pub fn reply(&mut self, message: &str, timestamp_ms: i64) -> ChatReply {
        let lower = message.to_lowercase();

        let response = match topic(&lower) {
            Some(Topic::Water) => self.water_reply(&lower, timestamp_ms),
            Some(Topic::Energy) => self.energy_reply(timestamp_ms),
            Some(Topic::Agriculture) => self.agriculture_reply(timestamp_ms),
            Some(Topic::Weather) => self.weather_reply(timestamp_ms),
            Some(Topic::System) => self.system_reply(timestamp_ms),
            None => DEFAULT_REPLY.to_string(),
        };

        ChatReply {
            response,
            timestamp: timestamp_ms,
        }
    }

    fn water_reply(&mut self, lower: &str, timestamp_ms: i64) -> String {
        let water = self.water(timestamp_ms);
        let leak = if lower.contains("leak") {
            "There's a potential leak detected in the northern sector that needs investigation. Would you like me to dispatch a maintenance alert?"
        } else {
            ""
        };
        format!(
            "The water supply system is currently running at {}% capacity with a flow rate of {}L/m. Water quality is at {}%. {}",
            water.reservoir, water.flow, water.quality, leak
        )
    }

    fn energy_reply(&mut self, timestamp_ms: i64) -> String {
        let energy = self.energy(timestamp_ms);
        let grid = energy.grid.parse::<f64>().unwrap_or_default();
        format!(
            "Energy consumption is currently {}. Solar panels are generating {} kW and battery storage is at {}%. Grid usage is {} at this time.",
            energy.status,
            energy.solar,
            energy.battery,
            if grid < 3.0 { "minimal" } else { "moderate" }
        )
    }

    fn agriculture_reply(&mut self, timestamp_ms: i64) -> String {
        let agriculture = self.agriculture(timestamp_ms);
        let irrigation = self.irrigation(timestamp_ms);

        let active: Vec<&str> = irrigation
            .zones
            .iter()
            .filter(|z| z.active)
            .filter_map(|z| z.name.split(' ').next())
            .collect();
        let state = if active.is_empty() {
            "currently inactive".to_string()
        } else {
            format!("active in {} zones", active.join(" and "))
        };
        let soil = agriculture.soil.parse::<f64>().unwrap_or_default();

        format!(
            "The smart irrigation system is {}. Soil moisture levels are at {}%, which is {}. {}",
            state,
            agriculture.soil,
            if soil > 40.0 {
                "within optimal range"
            } else {
                "below optimal range"
            },
            irrigation.recommendation
        )
    }

    fn weather_reply(&mut self, timestamp_ms: i64) -> String {
        let forecast = self.weather_forecast(timestamp_ms);
        let today = &forecast[0];
        let later = &forecast[2];

        let outlook = if later.icon.contains("rain") {
            format!(
                "There's a chance of rain on {} which should help with water conservation. I've already adjusted irrigation schedules accordingly.",
                later.day
            )
        } else {
            let trend = if forecast.iter().all(|f| f.icon.contains("sun")) {
                "consistently sunny"
            } else {
                "mixed"
            };
            format!(
                "The next few days look {}. I'll optimize irrigation based on this forecast.",
                trend
            )
        };

        format!(
            "The weather forecast shows {} conditions today with a high of {}. {}",
            sky(&today.icon),
            today.temperature,
            outlook
        )
    }

    fn system_reply(&mut self, timestamp_ms: i64) -> String {
        let dashboard = self.dashboard(timestamp_ms);
        let statuses = [
            (dashboard.energy.status, "Energy systems need attention. "),
            (dashboard.water.status, "Water systems need monitoring. "),
            (
                dashboard.agriculture.status,
                "Agricultural systems require adjustment. ",
            ),
        ];

        let overall = if statuses.iter().all(|(s, _)| *s == Status::Optimal) {
            "optimal"
        } else {
            "requiring attention"
        };
        let details: String = statuses
            .iter()
            .filter(|(s, _)| *s != Status::Optimal)
            .map(|(_, note)| *note)
            .collect();

        format!(
            "Overall system status is {}. {} Would you like detailed information about a specific subsystem?",
            overall, details
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_routing_prefers_water() {
        assert_eq!(topic("is there a leak near the solar farm"), Some(Topic::Water));
        assert_eq!(topic("battery level?"), Some(Topic::Energy));
        assert_eq!(topic("how dry is the soil"), Some(Topic::Agriculture));
        assert_eq!(topic("forecast for tomorrow"), Some(Topic::Weather));
        assert_eq!(topic("overall health"), Some(Topic::System));
        assert_eq!(topic("hello"), None);
    }

    #[test]
    fn test_unknown_question_gets_default_reply() {
        let reply = Simulator::seeded(1).reply("Hi there", 1_700_000_000_000);
        assert_eq!(reply.response, DEFAULT_REPLY);
        assert_eq!(reply.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_leak_question_mentions_dispatch() {
        let reply = Simulator::seeded(2).reply("Any LEAK today?", 1_700_000_000_000);
        assert!(reply.response.starts_with("The water supply system"));
        assert!(reply.response.contains("dispatch a maintenance alert"));
    }

    #[test]
    fn test_energy_reply_reports_status() {
        let reply = Simulator::seeded(3).reply("solar output?", 1_700_000_000_000);
        assert!(reply.response.starts_with("Energy consumption is currently"));
        assert!(reply.response.contains(" kW"));
    }

    #[test]
    fn test_weather_reply_describes_today() {
        let reply = Simulator::seeded(4).reply("What's the weather?", 1_700_000_000_000);
        assert!(reply.response.starts_with("The weather forecast shows"));
    }
}
