//! Connectivity and notification adapters

use crate::ports::outbound::{Connectivity, Notifier};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::info;

/// Connectivity flag set from outside (or fixed).
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    /// Start online or offline.
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// Flip the flag.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for StaticConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for StaticConnectivity {
    fn internet_available(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Writes UI signals to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn data_changed(&self) {
        info!("Data changed");
    }

    fn new_messages(&self, count: usize) {
        info!(count, "New messages");
    }
}

/// Counts UI signals.
#[derive(Debug, Default)]
pub struct CountingNotifier {
    changes: AtomicUsize,
    messages: AtomicUsize,
}

impl CountingNotifier {
    /// `data_changed` calls so far.
    pub fn changes(&self) -> usize {
        self.changes.load(Ordering::SeqCst)
    }

    /// Sum of all `new_messages` counts.
    pub fn messages(&self) -> usize {
        self.messages.load(Ordering::SeqCst)
    }
}

impl Notifier for CountingNotifier {
    fn data_changed(&self) {
        self.changes.fetch_add(1, Ordering::SeqCst);
    }

    fn new_messages(&self, count: usize) {
        self.messages.fetch_add(count, Ordering::SeqCst);
    }
}
