//! Synthetic telemetry generator.
//!
//! Every reading is `base + amplitude * sin(2π * hour / 24) + noise`, with
//! per-domain shaping applied on top (peak-hour water flow, seasonal soil
//! moisture, non-negative solar output). Randomness comes from the injected
//! [`Rng`], so a seeded [`StdRng`] reproduces a run exactly.

pub mod assistant;
pub mod events;
pub mod fallback;
pub mod thresholds;
pub mod weather;

use crate::domain::{
    AgricultureSnapshot, DashboardSnapshot, EnergySnapshot, HistoryPoint, WaterSnapshot,
};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

/// Shape of one simulated signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub base: f64,
    pub amplitude: f64,
    pub noise: f64,
}

impl Trend {
    pub const fn new(base: f64, amplitude: f64, noise: f64) -> Self {
        Self {
            base,
            amplitude,
            noise,
        }
    }

    /// Smallest value the unshaped signal can take
    pub fn lower(&self) -> f64 {
        self.base - self.amplitude - self.noise
    }

    /// Largest value the unshaped signal can take
    pub fn upper(&self) -> f64 {
        self.base + self.amplitude + self.noise
    }
}

pub mod profiles {
    use super::Trend;

    pub const SOLAR: Trend = Trend::new(2.0, 3.0, 0.5);
    pub const BATTERY: Trend = Trend::new(65.0, 15.0, 5.0);
    pub const GRID: Trend = Trend::new(4.0, 2.0, 1.0);
    pub const ENERGY_HISTORY: Trend = Trend::new(60.0, 30.0, 10.0);

    pub const RESERVOIR: Trend = Trend::new(70.0, 8.0, 3.0);
    pub const FLOW: Trend = Trend::new(40.0, 10.0, 5.0);
    pub const QUALITY: Trend = Trend::new(95.0, 5.0, 2.0);
    pub const WATER_HISTORY: Trend = Trend::new(65.0, 15.0, 5.0);

    pub const SOIL: Trend = Trend::new(45.0, 10.0, 5.0);
    pub const TEMPERATURE: Trend = Trend::new(24.0, 6.0, 2.0);

    pub const PEAK_FLOW_FACTOR: f64 = 1.5;
    pub const DRY_SEASON_SOIL_FACTOR: f64 = 0.7;
    pub const WET_SEASON_SOIL_FACTOR: f64 = 1.2;
}

/// Soil moisture below this level switches irrigation on during daylight
pub const IRRIGATION_SOIL_TRIGGER: f64 = 38.0;

const HISTORY_POINTS: i64 = 7;
const HISTORY_STEP_HOURS: i64 = 4;

/// Convert epoch milliseconds, clamping out-of-range input to the epoch
pub fn instant(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default()
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Morning and evening demand windows
pub fn is_peak_usage(hour: u32) -> bool {
    (6..=9).contains(&hour) || (18..=22).contains(&hour)
}

pub fn flow_factor(at: DateTime<Utc>) -> f64 {
    if is_peak_usage(at.hour()) {
        profiles::PEAK_FLOW_FACTOR
    } else {
        1.0
    }
}

/// June through September dry out the soil
pub fn seasonal_factor(at: DateTime<Utc>) -> f64 {
    if (5..=8).contains(&at.month0()) {
        profiles::DRY_SEASON_SOIL_FACTOR
    } else {
        profiles::WET_SEASON_SOIL_FACTOR
    }
}

fn daylight(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

/// Stateful wrapper around a random source
pub struct Simulator<R = StdRng> {
    rng: R,
}

impl Simulator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform draw in `[min, max)`; degenerate ranges collapse to `min`
    pub(crate) fn between(&mut self, min: f64, max: f64) -> f64 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// True when a unit draw lands strictly above `threshold`
    pub(crate) fn above(&mut self, threshold: f64) -> bool {
        self.rng.gen::<f64>() > threshold
    }

    pub(crate) fn pick<'a, T>(&mut self, pool: &'a [T]) -> &'a T {
        &pool[self.rng.gen_range(0..pool.len())]
    }

    pub(crate) fn random_bytes(&mut self) -> [u8; 16] {
        self.rng.gen()
    }

    pub(crate) fn trending(&mut self, trend: Trend, at: DateTime<Utc>) -> f64 {
        let day = (f64::from(at.hour()) / 24.0 * TAU).sin();
        let noise = self.between(-trend.noise, trend.noise);
        trend.base + trend.amplitude * day + noise
    }

    fn history<F>(&mut self, at: DateTime<Utc>, trend: Trend, shape: F) -> Vec<HistoryPoint>
    where
        F: Fn(DateTime<Utc>) -> f64,
    {
        (0..HISTORY_POINTS)
            .map(|i| {
                let sample_at = at
                    .checked_sub_signed(Duration::hours(24 - i * HISTORY_STEP_HOURS))
                    .unwrap_or(at);
                let value = (self.trending(trend, sample_at) * shape(sample_at)).round() as i64;
                HistoryPoint {
                    time: format!("{}:00", i * HISTORY_STEP_HOURS),
                    value,
                }
            })
            .collect()
    }

    pub fn energy(&mut self, timestamp_ms: i64) -> EnergySnapshot {
        let at = instant(timestamp_ms);

        let solar = self.trending(profiles::SOLAR, at).max(0.0);
        let battery = self.trending(profiles::BATTERY, at).round();
        let grid = self.trending(profiles::GRID, at);

        EnergySnapshot {
            solar: format!("{:.1}", solar),
            battery: format!("{}", battery as i64),
            grid: format!("{:.1}", grid),
            status: thresholds::energy_status(battery),
            history: self.history(at, profiles::ENERGY_HISTORY, |_| 1.0),
        }
    }

    pub fn water(&mut self, timestamp_ms: i64) -> WaterSnapshot {
        let at = instant(timestamp_ms);

        let reservoir = self.trending(profiles::RESERVOIR, at).round();
        let flow = (self.trending(profiles::FLOW, at) * flow_factor(at)).round();
        let quality = self.trending(profiles::QUALITY, at).round().min(100.0);

        WaterSnapshot {
            reservoir: format!("{}", reservoir as i64),
            flow: format!("{}", flow as i64),
            quality: format!("{}", quality as i64),
            status: thresholds::water_status(reservoir),
            history: self.history(at, profiles::WATER_HISTORY, flow_factor),
        }
    }

    pub fn agriculture(&mut self, timestamp_ms: i64) -> AgricultureSnapshot {
        let at = instant(timestamp_ms);

        let soil = (self.trending(profiles::SOIL, at) * seasonal_factor(at)).round();
        let temp = self.trending(profiles::TEMPERATURE, at).round();
        let irrigating = soil < IRRIGATION_SOIL_TRIGGER && daylight(at.hour());

        AgricultureSnapshot {
            soil: format!("{}", soil as i64),
            temp: format!("{}", temp as i64),
            irrigation: if irrigating { "ON" } else { "OFF" }.to_string(),
            status: thresholds::agriculture_status(soil),
            history: self.history(at, profiles::SOIL, seasonal_factor),
        }
    }

    /// Energy, water and agriculture for one instant plus narrative insights
    pub fn dashboard(&mut self, timestamp_ms: i64) -> DashboardSnapshot {
        let energy = self.energy(timestamp_ms);
        let water = self.water(timestamp_ms);
        let agriculture = self.agriculture(timestamp_ms);
        let insights = self.insights(&energy, timestamp_ms);

        DashboardSnapshot {
            energy,
            water,
            agriculture,
            insights,
        }
    }
}
