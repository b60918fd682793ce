//! Registry of open WebSocket connections.
//!
//! Each connection owns a bounded outbound queue drained by its writer task.
//! Broadcasts never wait on a slow consumer: a full queue loses that tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// A serialized text frame, shared between all recipients of a broadcast
pub type Frame = Arc<str>;

pub type ConnectionId = u64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
    pub closed: usize,
}

struct HubInner {
    connections: Mutex<HashMap<ConnectionId, mpsc::Sender<Frame>>>,
    next_id: AtomicU64,
    capacity: usize,
}

#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                connections: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<ConnectionId, mpsc::Sender<Frame>>> {
        self.inner
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a connection. `initial` is queued before the connection becomes
    /// visible to broadcasts, so it is always the first frame delivered.
    pub fn connect(&self, initial: Frame) -> Subscription {
        let (outbox, inbox) = mpsc::channel(self.inner.capacity);
        if outbox.try_send(initial).is_err() {
            warn!("initial frame rejected by a fresh queue");
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let open = {
            let mut connections = self.connections();
            connections.insert(id, outbox.clone());
            connections.len()
        };
        info!(connection = id, open, "client connected");

        Subscription {
            id,
            hub: self.clone(),
            outbox,
            inbox: Some(inbox),
        }
    }

    fn disconnect(&self, id: ConnectionId) {
        let (removed, open) = {
            let mut connections = self.connections();
            let removed = connections.remove(&id).is_some();
            (removed, connections.len())
        };
        if removed {
            info!(connection = id, open, "client disconnected");
        }
    }

    /// Offer `frame` to every open connection without blocking
    pub fn broadcast(&self, frame: Frame) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut connections = self.connections();

        connections.retain(|id, outbox| match outbox.try_send(Arc::clone(&frame)) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(connection = *id, "outbound queue full, dropping update");
                report.dropped += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection = *id, "outbound queue closed, unregistering");
                report.closed += 1;
                false
            }
        });

        report
    }

    pub fn connection_count(&self) -> usize {
        self.connections().len()
    }
}

/// Handle for one open connection; dropping it unregisters the connection
pub struct Subscription {
    id: ConnectionId,
    hub: Hub,
    outbox: mpsc::Sender<Frame>,
    inbox: Option<mpsc::Receiver<Frame>>,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue drained by the connection's writer; available once
    pub fn take_inbox(&mut self) -> Option<mpsc::Receiver<Frame>> {
        self.inbox.take()
    }

    /// Sender for replies addressed only to this connection
    pub fn outbox(&self) -> mpsc::Sender<Frame> {
        self.outbox.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.disconnect(self.id);
    }
}
