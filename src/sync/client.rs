/// WebSocket runner feeding a `DashboardStore`
use super::{DashboardStore, SyncError};
use crate::config::ClientConfig;
use crate::realtime::protocol::DataKind;
use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

const REFRESHED: [DataKind; 3] = [DataKind::Alerts, DataKind::Irrigation, DataKind::Weather];

fn every(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

struct Ticks {
    offline: Interval,
    chart: Interval,
    refresh: Interval,
}

impl Ticks {
    fn new(config: &ClientConfig) -> Self {
        Self {
            offline: every(config.offline_tick),
            chart: every(config.chart_tick),
            refresh: every(config.refresh_every),
        }
    }
}

/// Marks the store connected for as long as it lives. Dropping it, on any
/// exit path including cancellation, marks the store disconnected again.
struct Online<'a> {
    store: &'a mut DashboardStore,
}

impl<'a> Online<'a> {
    fn new(store: &'a mut DashboardStore) -> Self {
        store.set_connected(true);
        Self { store }
    }
}

impl Deref for Online<'_> {
    type Target = DashboardStore;

    fn deref(&self) -> &DashboardStore {
        self.store
    }
}

impl DerefMut for Online<'_> {
    fn deref_mut(&mut self) -> &mut DashboardStore {
        self.store
    }
}

impl Drop for Online<'_> {
    fn drop(&mut self) {
        self.store.set_connected(false);
    }
}

pub struct DashboardClient {
    config: ClientConfig,
    store: DashboardStore,
    rng: StdRng,
}

impl DashboardClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            store: DashboardStore::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    /// Stay connected forever, reconnecting after every drop
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut ticks = Ticks::new(&self.config);
        loop {
            match self.session(&mut ticks).await {
                Ok(()) => info!("server closed the connection"),
                Err(e) => warn!(error = %e, "connection lost"),
            }
            self.idle(&mut ticks).await;
        }
    }

    /// Run a single connection until it closes
    pub async fn connect_once(&mut self) -> Result<(), SyncError> {
        let mut ticks = Ticks::new(&self.config);
        self.session(&mut ticks).await
    }

    async fn session(&mut self, ticks: &mut Ticks) -> Result<(), SyncError> {
        let (socket, _) = connect_async(self.config.ws_url.as_str()).await?;
        info!(url = %self.config.ws_url, "connected to telemetry server");

        let Self { store, rng, .. } = self;
        let mut store = Online::new(store);
        let (mut sink, mut stream) = socket.split();

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => on_frame(&mut store, &text),
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                },
                _ = ticks.offline.tick() => {
                    store.perturb_offline(&mut *rng);
                }
                _ = ticks.chart.tick() => roll_charts(&mut store, &mut *rng),
                _ = ticks.refresh.tick() => {
                    for kind in REFRESHED {
                        let request = store.request_refresh(kind)?;
                        sink.send(Message::Text(serde_json::to_string(&request)?)).await?;
                    }
                }
            }
        }
    }

    // Keep the local dashboard alive until it is time to reconnect
    async fn idle(&mut self, ticks: &mut Ticks) {
        let reconnect = sleep(self.config.reconnect_delay);
        tokio::pin!(reconnect);

        loop {
            tokio::select! {
                _ = &mut reconnect => return,
                _ = ticks.offline.tick() => {
                    if self.store.perturb_offline(&mut self.rng) {
                        debug!(energy = %self.store.energy_card().summary(), "offline drift");
                    }
                }
                _ = ticks.chart.tick() => roll_charts(&mut self.store, &mut self.rng),
                _ = ticks.refresh.tick() => {
                    if let Err(e) = self.store.request_refresh(DataKind::Alerts) {
                        debug!(error = %e, "refresh skipped");
                    }
                }
            }
        }
    }
}

fn on_frame(store: &mut DashboardStore, text: &str) {
    match store.apply_text(text) {
        Ok(()) => debug!(
            energy = %store.energy_card().summary(),
            water = %store.water_card().summary(),
            agriculture = %store.agriculture_card().summary(),
            "dashboard updated"
        ),
        Err(e) => warn!(error = %e, "dropping server frame"),
    }
}

fn roll_charts(store: &mut DashboardStore, rng: &mut StdRng) {
    store.roll_charts(rng);
    info!(
        alerts = store.alerts().len(),
        connected = store.is_connected(),
        "{} | {} | {}",
        store.energy_card().summary(),
        store.water_card().summary(),
        store.agriculture_card().summary()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncError;

    #[test]
    fn test_online_guard_clears_flag_on_drop() {
        let mut store = DashboardStore::new();
        {
            let online = Online::new(&mut store);
            assert!(online.is_connected());
            assert!(online.request_refresh(DataKind::Alerts).is_ok());
        }
        assert!(!store.is_connected());
        assert!(matches!(
            store.request_refresh(DataKind::Alerts),
            Err(SyncError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_store_offline() {
        let mut client = DashboardClient::new(ClientConfig {
            ws_url: "ws://127.0.0.1:9/ws".to_string(),
            offline_tick: Duration::from_secs(5),
            chart_tick: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(1),
            refresh_every: Duration::from_secs(60),
        });
        assert!(matches!(
            client.connect_once().await,
            Err(SyncError::Transport(_))
        ));
        assert!(!client.store().is_connected());
    }
}
