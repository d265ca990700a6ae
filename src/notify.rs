use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::LedgerEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for ledger changes, per engineer and globally.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<LedgerEvent>>,
    all: broadcast::Sender<LedgerEvent>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            all: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Subscribe to changes for one engineer. Creates the channel if needed.
    pub fn subscribe(&self, engineer_id: Ulid) -> broadcast::Receiver<LedgerEvent> {
        let sender = self
            .channels
            .entry(engineer_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Subscribe to every change.
    pub fn subscribe_all(&self) -> broadcast::Receiver<LedgerEvent> {
        self.all.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, event: &LedgerEvent) {
        for engineer_id in event.engineer_ids() {
            if let Some(sender) = self.channels.get(&engineer_id) {
                let _ = sender.send(event.clone());
            }
        }
        let _ = self.all.send(event.clone());
    }

    pub fn remove(&self, engineer_id: &Ulid) {
        self.channels.remove(engineer_id);
    }
}
