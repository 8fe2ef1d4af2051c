//! Cloud synchronization: engine, retry queue, and connectivity monitor.

mod engine;
mod monitor;
mod retry;

pub use engine::SyncEngine;
pub use monitor::{Connectivity, ConnectivityMonitor};
pub use retry::{RetryEntry, RetryQueue};
