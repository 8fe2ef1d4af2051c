use std::time::Duration;

use taskflow_core::sync::{Connectivity, ConnectivityMonitor};
use taskflow_core::WorkspaceService;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;

use crate::error::CliError;

/// How often the remote store is probed for reachability.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Feed the connectivity monitor from reachability probes and print status
/// changes and remote updates until Ctrl-C.
pub async fn run_watch(workspace: &WorkspaceService) -> Result<(), CliError> {
    let engine = workspace.engine().clone();
    if !engine.has_remote() {
        return Err(CliError::SyncNotConfigured);
    }

    let (signals, receiver) = mpsc::channel(8);
    let monitor = ConnectivityMonitor::new(engine.clone(), false).spawn(receiver);
    let mut status = engine.watch_status();
    let mut updates = engine.subscribe_updates();
    let mut probe = tokio::time::interval(PROBE_INTERVAL);
    probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!("Watching {} (Ctrl-C to stop)", engine.config().user_id);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = probe.tick() => {
                let signal = if engine.probe_remote().await {
                    Connectivity::Online
                } else {
                    Connectivity::Offline
                };
                if signals.send(signal).await.is_err() {
                    break;
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                println!("status: {current}");
            }
            update = updates.recv() => match update {
                Ok(key) => println!("{key} updated (version {})", engine.version(key)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {skipped} update notifications");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    drop(signals);
    if let Err(error) = monitor.await {
        tracing::warn!("Connectivity monitor failed: {error}");
    }
    engine.settle().await;
    println!("Stopped watching");
    Ok(())
}
