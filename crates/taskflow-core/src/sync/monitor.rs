//! Turns platform online/offline signals and a fallback tick into sync work.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::SyncEngine;
use crate::state::SyncStatus;

/// Platform connectivity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

/// Drives the retry queue and re-pulls when connectivity comes back.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    engine: SyncEngine,
    online: bool,
}

impl ConnectivityMonitor {
    #[must_use]
    pub const fn new(engine: SyncEngine, online: bool) -> Self {
        Self { engine, online }
    }

    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.online
    }

    /// React to a connectivity signal.
    ///
    /// Going online drains the retry queue and then pulls; repeated online
    /// signals are ignored. Going offline only updates the status.
    pub async fn handle(&mut self, signal: Connectivity) {
        match signal {
            Connectivity::Online => {
                if self.online {
                    return;
                }
                self.online = true;
                tracing::info!("Connection restored");
                if !self.engine.has_remote() {
                    return;
                }
                self.engine.set_status(SyncStatus::Syncing);
                self.engine.drain().await;
                self.engine.pull_remote().await;
            }
            Connectivity::Offline => {
                if self.online {
                    tracing::info!("Connection lost, working offline");
                }
                self.online = false;
                self.engine.set_status(SyncStatus::Offline);
            }
        }
    }

    /// Periodic safety net: drain while online. Returns delivered writes.
    pub async fn tick(&self) -> usize {
        if !self.online || !self.engine.has_remote() {
            return 0;
        }
        self.engine.drain().await
    }

    /// Process `signals` and the poll interval until the signal channel closes.
    pub async fn run(mut self, mut signals: mpsc::Receiver<Connectivity>) {
        let period = self.engine.config().poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                signal = signals.recv() => match signal {
                    Some(signal) => self.handle(signal).await,
                    None => break,
                },
                _ = ticker.tick() => {
                    let delivered = self.tick().await;
                    if delivered > 0 {
                        tracing::debug!("Periodic drain delivered {delivered} writes");
                    }
                }
            }
        }
        tracing::debug!("Connectivity monitor stopped");
    }

    pub fn spawn(self, signals: mpsc::Receiver<Connectivity>) -> JoinHandle<()> {
        tokio::spawn(self.run(signals))
    }
}
