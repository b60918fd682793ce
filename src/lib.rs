//! Rural infrastructure monitoring: simulated telemetry, live push to
//! dashboards over WebSocket, and the client-side store that mirrors it.

pub mod clients;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod realtime;
pub mod routes;
pub mod services;
pub mod simulation;
pub mod sync;
