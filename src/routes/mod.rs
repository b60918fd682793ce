/// Application routes configuration
use crate::handlers::{
    chat, detect_leak, get_agriculture, get_alerts, get_dashboard, get_energy, get_energy_market,
    get_irrigation, get_water, get_weather, health, optimize_irrigation, predict_energy, AppState,
};
use crate::realtime::socket::ws_handler;
use axum::{
    routing::{get, post},
    Router,
};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Live telemetry
        .route("/ws", get(ws_handler))
        // Simulated snapshots
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/energy", get(get_energy))
        .route("/api/water", get(get_water))
        .route("/api/agriculture", get(get_agriculture))
        .route("/api/alerts", get(get_alerts))
        .route("/api/irrigation", get(get_irrigation))
        .route("/api/weather", get(get_weather))
        .route("/api/chat", post(chat))
        // ML proxy with simulation fallback
        .route("/api/ml/energy/predict", post(predict_energy))
        .route("/api/ml/water/detect-leak", post(detect_leak))
        .route(
            "/api/ml/agriculture/optimize-irrigation",
            post(optimize_irrigation),
        )
        .route("/api/blockchain/energy-market", get(get_energy_market))
        .with_state(state)
}
