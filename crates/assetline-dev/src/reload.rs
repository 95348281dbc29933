//! Reload broadcast to connected browsers

use serde::Serialize;
use tokio::sync::broadcast;

/// A finished rebuild viewers should pick up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadEvent {
    /// Tasks that were rebuilt
    pub tasks: Vec<String>,
}

/// Fan-out of reload events; cheap to clone
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Broadcast a reload; returns how many viewers were listening
    pub fn reload(&self, tasks: Vec<String>) -> usize {
        // No receivers just means no browser is connected
        self.tx.send(ReloadEvent { tasks }).unwrap_or(0)
    }

    pub fn viewers(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new(16)
    }
}
