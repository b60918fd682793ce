/// Application configuration module
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub ml_api_url: String,
    pub upstream_timeout_seconds: u64,
    pub realtime: RealtimeSettings,
}

#[derive(Clone, Debug)]
pub struct RealtimeSettings {
    pub update_seconds: u64,
    pub queue_capacity: usize,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let ml_api_url = env::var("ML_API_URL")
            .unwrap_or_else(|_| "http://localhost:5001".to_string())
            .trim_end_matches('/')
            .to_string();

        let realtime = RealtimeSettings {
            update_seconds: env_u64("UPDATE_EVERY_SECONDS", 5).max(1),
            queue_capacity: env_u64("WS_QUEUE_CAPACITY", 32).max(1) as usize,
        };

        Ok(Self {
            bind_addr,
            ml_api_url,
            upstream_timeout_seconds: env_u64("UPSTREAM_TIMEOUT_SECONDS", 5),
            realtime,
        })
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.realtime.update_seconds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            ml_api_url: "http://localhost:5001".to_string(),
            upstream_timeout_seconds: 5,
            realtime: RealtimeSettings {
                update_seconds: 5,
                queue_capacity: 32,
            },
        }
    }
}

/// Settings for the dashboard client binary
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub ws_url: String,
    pub offline_tick: Duration,
    pub chart_tick: Duration,
    pub reconnect_delay: Duration,
    pub refresh_every: Duration,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let ws_url = env::var("DASHBOARD_WS_URL")
            .unwrap_or_else(|_| "ws://127.0.0.1:3000/ws".to_string());

        Ok(Self {
            ws_url,
            offline_tick: Duration::from_secs(env_u64("OFFLINE_TICK_SECONDS", 5).max(1)),
            chart_tick: Duration::from_secs(env_u64("CHART_TICK_SECONDS", 10).max(1)),
            reconnect_delay: Duration::from_secs(env_u64("RECONNECT_SECONDS", 3).max(1)),
            refresh_every: Duration::from_secs(env_u64("REFRESH_EVERY_SECONDS", 60).max(1)),
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
