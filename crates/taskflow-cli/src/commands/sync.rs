use serde::Serialize;
use taskflow_core::{CollectionKey, SyncStatus, WorkspaceService};

use crate::cli::SyncCommands;
use crate::commands::common::format_timestamp;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SyncStatusReport {
    pub status: SyncStatus,
    pub remote_configured: bool,
    pub user_id: String,
    pub device_id: String,
    pub pending_writes: usize,
    pub collections: Vec<CollectionReport>,
}

#[derive(Debug, Serialize)]
pub struct CollectionReport {
    pub key: CollectionKey,
    pub items: usize,
    pub version: i64,
    pub version_iso: String,
}

pub async fn run_sync(
    command: Option<SyncCommands>,
    workspace: &WorkspaceService,
) -> Result<(), CliError> {
    match command {
        None => run_sync_now(workspace).await,
        Some(SyncCommands::Status { json }) => run_sync_status(json, workspace).await,
        Some(SyncCommands::Test) => run_sync_test(workspace).await,
    }
}

/// Flush queued writes, then pull both collections.
pub async fn run_sync_now(workspace: &WorkspaceService) -> Result<(), CliError> {
    let engine = workspace.engine();
    if !engine.has_remote() {
        return Err(CliError::SyncNotConfigured);
    }

    let delivered = engine.drain().await;
    if delivered > 0 {
        tracing::info!("Delivered {delivered} queued writes");
    }
    engine.pull_remote().await;
    engine.settle().await;

    match engine.status() {
        SyncStatus::Synced => {
            println!("Sync completed");
            Ok(())
        }
        status => Err(CliError::SyncIncomplete(status)),
    }
}

pub async fn sync_status_report(workspace: &WorkspaceService) -> SyncStatusReport {
    let engine = workspace.engine();
    let counts = engine
        .read(|collections| (collections.jobs.len(), collections.notes.len()))
        .await;

    let collections = CollectionKey::ALL
        .into_iter()
        .map(|key| {
            let version = engine.version(key);
            CollectionReport {
                key,
                items: match key {
                    CollectionKey::Jobs => counts.0,
                    CollectionKey::Notes => counts.1,
                },
                version,
                version_iso: format_timestamp(version),
            }
        })
        .collect();

    SyncStatusReport {
        status: engine.status(),
        remote_configured: engine.has_remote(),
        user_id: engine.config().user_id.clone(),
        device_id: engine.device_id().to_string(),
        pending_writes: engine.retry_queue_len(),
        collections,
    }
}

async fn run_sync_status(as_json: bool, workspace: &WorkspaceService) -> Result<(), CliError> {
    let report = sync_status_report(workspace).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for line in format_sync_status_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_sync_status_lines(report: &SyncStatusReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "status:   {}{}",
            report.status,
            if report.remote_configured {
                ""
            } else {
                " (local-only)"
            }
        ),
        format!("user:     {}", report.user_id),
        format!("device:   {}", report.device_id),
        format!("pending:  {} writes", report.pending_writes),
    ];
    lines.extend(report.collections.iter().map(|collection| {
        let label = format!("{}:", collection.key);
        format!(
            "{label:<9} {} items, version {}",
            collection.items, collection.version_iso
        )
    }));
    lines
}

async fn run_sync_test(workspace: &WorkspaceService) -> Result<(), CliError> {
    let engine = workspace.engine();
    if !engine.has_remote() {
        return Err(CliError::SyncNotConfigured);
    }

    engine.test_connection().await?;
    println!("Connection test passed for user {}", engine.config().user_id);
    Ok(())
}
