//! Connection state tracking for the document store.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Last known reachability of the document store.
///
/// Updated by the connect loop, by every store operation, and by the
/// background health check. All atomics use `SeqCst`.
#[derive(Debug, Default)]
pub struct ConnectionState {
    connected: AtomicBool,
    /// Attempts since the last successful connection
    connect_attempts: AtomicU32,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record reachability. Returns the previous value so callers can log
    /// transitions only.
    pub fn set_connected(&self, connected: bool) -> bool {
        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if connected {
            self.connect_attempts.store(0, Ordering::SeqCst);
        }
        previous
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn increment_attempts(&self) -> u32 {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst) + 1
    }
}
