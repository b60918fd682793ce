/// Fixed status thresholds shared by the generator and the client store
use crate::domain::{AgricultureSnapshot, EnergySnapshot, Status, WaterSnapshot};

/// Lower bounds below which a reading degrades the domain status
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub critical_below: f64,
    pub attention_below: f64,
}

impl Bands {
    pub fn classify(&self, value: f64) -> Status {
        if value < self.critical_below {
            Status::Critical
        } else if value < self.attention_below {
            Status::Attention
        } else {
            Status::Optimal
        }
    }
}

/// Battery charge, percent
pub const ENERGY_BATTERY: Bands = Bands {
    critical_below: 30.0,
    attention_below: 50.0,
};

/// Reservoir level, percent
pub const WATER_RESERVOIR: Bands = Bands {
    critical_below: 40.0,
    attention_below: 60.0,
};

/// Soil moisture, percent
pub const AGRICULTURE_SOIL: Bands = Bands {
    critical_below: 30.0,
    attention_below: 38.0,
};

pub fn energy_status(battery: f64) -> Status {
    ENERGY_BATTERY.classify(battery)
}

pub fn water_status(reservoir: f64) -> Status {
    WATER_RESERVOIR.classify(reservoir)
}

pub fn agriculture_status(soil: f64) -> Status {
    AGRICULTURE_SOIL.classify(soil)
}

/// Parse a display-formatted reading such as `"42"` or `"3.4"`
pub fn reading(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// Readings that cannot be parsed are flagged for attention rather than trusted.
fn classify_reading(bands: Bands, s: &str) -> Status {
    reading(s)
        .map(|v| bands.classify(v))
        .unwrap_or(Status::Attention)
}

pub fn energy_status_of(snapshot: &EnergySnapshot) -> Status {
    classify_reading(ENERGY_BATTERY, &snapshot.battery)
}

pub fn water_status_of(snapshot: &WaterSnapshot) -> Status {
    classify_reading(WATER_RESERVOIR, &snapshot.reservoir)
}

pub fn agriculture_status_of(snapshot: &AgricultureSnapshot) -> Status {
    classify_reading(AGRICULTURE_SOIL, &snapshot.soil)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soil_thresholds() {
        assert_eq!(agriculture_status(25.0), Status::Critical);
        assert_eq!(agriculture_status(35.0), Status::Attention);
        assert_eq!(agriculture_status(60.0), Status::Optimal);
    }

    #[test]
    fn test_band_edges_are_exclusive() {
        assert_eq!(energy_status(30.0), Status::Attention);
        assert_eq!(energy_status(29.9), Status::Critical);
        assert_eq!(energy_status(50.0), Status::Optimal);
        assert_eq!(water_status(40.0), Status::Attention);
        assert_eq!(water_status(60.0), Status::Optimal);
        assert_eq!(agriculture_status(38.0), Status::Optimal);
    }

    #[test]
    fn test_reading_parses_formatted_values() {
        assert_eq!(reading("42"), Some(42.0));
        assert_eq!(reading(" 3.4 "), Some(3.4));
        assert_eq!(reading("n/a"), None);
        assert_eq!(reading("NaN"), None);
    }

    #[test]
    fn test_unparsable_reading_needs_attention() {
        let snapshot = WaterSnapshot {
            reservoir: "--".to_string(),
            flow: "40".to_string(),
            quality: "95".to_string(),
            status: Status::Optimal,
            history: Vec::new(),
        };
        assert_eq!(water_status_of(&snapshot), Status::Attention);
    }
}
