use futures_util::{SinkExt, StreamExt};
use rural_monitor::config::{AppConfig, ClientConfig, RealtimeSettings};
use rural_monitor::handlers::AppState;
use rural_monitor::realtime::protocol::DataKind;
use rural_monitor::realtime::run_broadcaster;
use rural_monitor::routes::build_router;
use rural_monitor::simulation::thresholds::energy_status_of;
use rural_monitor::simulation::Simulator;
use rural_monitor::sync::{DashboardClient, SyncError};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, connect_async, tungstenite::Message};

async fn spawn_server() -> (String, AppState) {
    let config = AppConfig {
        ml_api_url: "http://127.0.0.1:9".to_string(),
        upstream_timeout_seconds: 1,
        realtime: RealtimeSettings {
            update_seconds: 1,
            queue_capacity: 8,
        },
        ..AppConfig::default()
    };
    let state = AppState::new(&config, Simulator::seeded(11)).expect("state builds");

    tokio::spawn(run_broadcaster(
        state.hub.clone(),
        state.simulation.clone(),
        config.update_interval(),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = build_router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });

    (format!("ws://{}/ws", addr), state)
}

async fn next_json<S>(stream: &mut S) -> Value
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("json frame");
        }
    }
}

#[tokio::test]
async fn test_initial_update_and_request_response() {
    let (url, state) = spawn_server().await;
    let (socket, _) = connect_async(url.as_str()).await.expect("connects");
    let (mut sink, mut stream) = socket.split();

    let initial = next_json(&mut stream).await;
    assert_eq!(initial["type"], json!("initial"));
    assert_eq!(initial["data"].as_object().map(|o| o.len()), Some(6));
    assert_eq!(initial["data"]["weatherForecast"].as_array().map(Vec::len), Some(5));

    let update = next_json(&mut stream).await;
    assert_eq!(update["type"], json!("update"));
    let data = update["data"].as_object().cloned().unwrap_or_default();
    let mut keys: Vec<&String> = data.keys().collect();
    keys.sort();
    assert_eq!(keys, ["agriculture", "energy", "water"]);

    let request = json!({"type": "request_data", "dataType": "alerts", "requestId": "abc"});
    sink.send(Message::Text(request.to_string()))
        .await
        .expect("request sent");

    // updates may interleave with the reply
    let response = loop {
        let frame = next_json(&mut stream).await;
        if frame["type"] == json!("response") {
            break frame;
        }
    };
    assert_eq!(response["dataType"], json!("alerts"));
    assert_eq!(response["requestId"], json!("abc"));
    assert!(response["data"].as_array().map(|a| a.len() >= 3).unwrap_or(false));

    assert_eq!(state.hub.connection_count(), 1);
    drop(sink);
    drop(stream);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while state.hub.connection_count() != 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(state.hub.connection_count(), 0);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let (url, _state) = spawn_server().await;
    let (socket, _) = connect_async(url.as_str()).await.expect("connects");
    let (mut sink, mut stream) = socket.split();

    next_json(&mut stream).await;
    sink.send(Message::Text("{not json".to_string()))
        .await
        .expect("sent");
    sink.send(Message::Text(
        json!({"type": "request_data", "dataType": "weather", "requestId": 5}).to_string(),
    ))
    .await
    .expect("sent");

    let response = loop {
        let frame = next_json(&mut stream).await;
        if frame["type"] == json!("response") {
            break frame;
        }
    };
    assert_eq!(response["requestId"], json!(5));
    assert_eq!(response["data"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn test_dashboard_client_mirrors_server() {
    let (url, _state) = spawn_server().await;
    let mut client = DashboardClient::new(ClientConfig {
        ws_url: url,
        offline_tick: Duration::from_secs(5),
        chart_tick: Duration::from_secs(10),
        reconnect_delay: Duration::from_secs(3),
        refresh_every: Duration::from_secs(60),
    });

    // the session only ends when the server goes away
    let _ = timeout(Duration::from_millis(2500), client.connect_once()).await;

    let store = client.store();
    assert!(!store.is_connected());
    assert!(store.last_update().is_some());
    assert_eq!(store.last_frame().map(|f| f["type"].clone()), Some(json!("update")));
    assert_eq!(store.energy().status, energy_status_of(store.energy()));
    assert!(store.energy().history.len() == 7);
}

#[tokio::test]
async fn test_closed_session_leaves_store_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(tcp).await.expect("handshake");
        let _ = ws.close(None).await;
        // drain until the client acknowledges the close
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut client = DashboardClient::new(ClientConfig {
        ws_url: format!("ws://{}/ws", addr),
        offline_tick: Duration::from_secs(5),
        chart_tick: Duration::from_secs(10),
        reconnect_delay: Duration::from_secs(3),
        refresh_every: Duration::from_secs(60),
    });

    let outcome = timeout(Duration::from_secs(5), client.connect_once())
        .await
        .expect("session ends when the server closes");
    assert!(outcome.is_ok());

    let store = client.store();
    assert!(!store.is_connected());
    assert!(matches!(
        store.request_refresh(DataKind::Alerts),
        Err(SyncError::Disconnected)
    ));
}
