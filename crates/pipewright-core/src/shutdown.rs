//! Explicit shutdown signalling for long-lived tasks.
//!
//! A [`KeepAlive`] never completes on its own; it resolves once the paired
//! [`ShutdownTrigger`] fires (or is dropped, which means nobody can fire it).

use tokio::sync::watch;
use tracing::debug;

/// Creates a connected trigger/handle pair.
pub fn shutdown_channel() -> (ShutdownTrigger, KeepAlive) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, KeepAlive { rx })
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn fire(&self) {
        debug!("shutdown requested");
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct KeepAlive {
    rx: watch::Receiver<bool>,
}

impl KeepAlive {
    /// Blocks until shutdown has been requested.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
