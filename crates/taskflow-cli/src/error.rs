use std::io;

use taskflow_core::remote::RemoteError;
use taskflow_core::SyncStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] taskflow_core::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Attachment number must be 1 or greater")]
    InvalidAttachmentPosition,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Sync did not complete (status: {0}); local changes are kept and retried later")]
    SyncIncomplete(SyncStatus),
    #[error(
        "Sync is not configured. Run `taskflow config init --remote-url <URL>`, or set TASKFLOW_REMOTE_URL (and TASKFLOW_API_KEY)."
    )]
    SyncNotConfigured,
}
