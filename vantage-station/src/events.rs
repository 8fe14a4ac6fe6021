use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use vantage_core::WeatherReading;

/// Outcome of an `open()` attempt, delivered to connect subscribers.
///
/// `error` is `None` when the link came up.
#[derive(Debug, Clone)]
pub struct ConnectEvent {
    pub error: Option<Box<str>>,
}

/// In-process publish/subscribe fan-out for station events.
///
/// Subscriptions are typed per event: `connect` for link attempts and
/// `loop` for decoded readings. Events reach every live subscriber in
/// emission order; a subscriber whose receiver was dropped is pruned on
/// the next emit.
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    connect_subs: Vec<mpsc::Sender<ConnectEvent>>,
    loop_subs: Vec<mpsc::Sender<WeatherReading>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub async fn subscribe_connect(&self) -> mpsc::Receiver<ConnectEvent> {
        let (tx, rx) = mpsc::channel(16);
        self.inner.lock().await.connect_subs.push(tx);
        rx
    }

    pub async fn subscribe_loop(&self) -> mpsc::Receiver<WeatherReading> {
        let (tx, rx) = mpsc::channel(64);
        self.inner.lock().await.loop_subs.push(tx);
        rx
    }

    pub(crate) async fn emit_connect(&self, event: ConnectEvent) {
        let mut inner = self.inner.lock().await;
        let subs = std::mem::take(&mut inner.connect_subs);
        let mut live = Vec::with_capacity(subs.len());
        for tx in subs {
            if tx.send(event.clone()).await.is_ok() {
                live.push(tx);
            }
        }
        inner.connect_subs = live;
    }

    pub(crate) async fn emit_loop(&self, reading: WeatherReading) {
        let mut inner = self.inner.lock().await;
        let subs = std::mem::take(&mut inner.loop_subs);
        let mut live = Vec::with_capacity(subs.len());
        for tx in subs {
            if tx.send(reading.clone()).await.is_ok() {
                live.push(tx);
            }
        }
        inner.loop_subs = live;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
