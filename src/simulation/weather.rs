use super::{instant, Simulator};
use crate::domain::WeatherForecastEntry;
use chrono::Days;
use rand::Rng;

pub const FORECAST_DAYS: u64 = 5;

/// A weather category with its draw probability and temperature range in °C
struct Category {
    icon: &'static str,
    probability: f64,
    temp: (f64, f64),
}

// Probabilities sum to 1.0.
const CATEGORIES: [Category; 5] = [
    Category {
        icon: "fa-sun",
        probability: 0.3,
        temp: (28.0, 35.0),
    },
    Category {
        icon: "fa-cloud",
        probability: 0.3,
        temp: (24.0, 30.0),
    },
    Category {
        icon: "fa-cloud-sun",
        probability: 0.2,
        temp: (26.0, 32.0),
    },
    Category {
        icon: "fa-cloud-rain",
        probability: 0.15,
        temp: (20.0, 28.0),
    },
    Category {
        icon: "fa-cloud-showers-heavy",
        probability: 0.05,
        temp: (18.0, 25.0),
    },
];

fn category_for(draw: f64) -> &'static Category {
    let mut cumulative = 0.0;
    for category in &CATEGORIES {
        cumulative += category.probability;
        if draw <= cumulative {
            return category;
        }
    }
    &CATEGORIES[0]
}

/// Temperature range for a forecast icon
pub fn temperature_range(icon: &str) -> Option<(f64, f64)> {
    CATEGORIES.iter().find(|c| c.icon == icon).map(|c| c.temp)
}

impl<R: Rng> Simulator<R> {
    /// Five consecutive days starting on the reference date
    pub fn weather_forecast(&mut self, timestamp_ms: i64) -> Vec<WeatherForecastEntry> {
        let today = instant(timestamp_ms).date_naive();

        (0..FORECAST_DAYS)
            .map(|offset| {
                let date = today.checked_add_days(Days::new(offset)).unwrap_or(today);
                let draw = self.between(0.0, 1.0);
                let category = category_for(draw);
                let temperature = self.between(category.temp.0, category.temp.1).round();

                WeatherForecastEntry {
                    day: date.format("%a").to_string(),
                    icon: category.icon.to_string(),
                    temperature: format!("{}°C", temperature as i64),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_forecast_has_five_consecutive_days() {
        // 2024-06-14 is a Friday
        let t = Utc
            .with_ymd_and_hms(2024, 6, 14, 23, 59, 0)
            .single()
            .map(|t| t.timestamp_millis())
            .unwrap_or_default();
        let forecast = Simulator::seeded(10).weather_forecast(t);
        let days: Vec<&str> = forecast.iter().map(|f| f.day.as_str()).collect();
        assert_eq!(days, ["Fri", "Sat", "Sun", "Mon", "Tue"]);
    }

    #[test]
    fn test_temperatures_fall_in_category_range() {
        let mut sim = Simulator::seeded(22);
        for _ in 0..50 {
            for entry in sim.weather_forecast(0) {
                let (min, max) = temperature_range(&entry.icon).unwrap_or((f64::NAN, f64::NAN));
                let value: f64 = entry
                    .temperature
                    .trim_end_matches("°C")
                    .parse()
                    .unwrap_or(f64::NAN);
                assert!(value >= min && value <= max, "{} outside {:?}", value, (min, max));
            }
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let total: f64 = CATEGORIES.iter().map(|c| c.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_lookup_by_draw() {
        assert_eq!(category_for(0.0).icon, "fa-sun");
        assert_eq!(category_for(0.45).icon, "fa-cloud");
        assert_eq!(category_for(0.7).icon, "fa-cloud-sun");
        assert_eq!(category_for(0.9).icon, "fa-cloud-rain");
        assert_eq!(category_for(0.99).icon, "fa-cloud-showers-heavy");
    }
}
