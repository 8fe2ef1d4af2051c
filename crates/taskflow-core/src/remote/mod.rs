//! Remote per-user document store contract.
//!
//! The sync engine only talks to the cloud through [`RemoteStore`]. Documents
//! are addressed by `(user_id, key)` and always carry a versioned
//! [`Snapshot`].

mod http;
mod memory;

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::Snapshot;

/// Errors reported by a remote document store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Network failure, timeout, or server-side outage
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    /// Credentials rejected or access rules deny the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// The remote answered with a body we could not interpret
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
    /// Any other non-success response
    #[error("Remote store API error: {0}")]
    Api(String),
}

impl RemoteError {
    /// Whether the failure is an access problem rather than a connectivity one.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Message delivered to a document subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// The document now holds this snapshot
    Changed(Snapshot),
    /// The subscription broke; no further events follow
    Failed(RemoteError),
}

/// A remote per-user document database.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a document, `None` when it does not exist
    async fn get(&self, user_id: &str, key: &str) -> RemoteResult<Option<Snapshot>>;

    /// Create or merge-update a document
    async fn upsert_merge(&self, user_id: &str, key: &str, snapshot: &Snapshot)
        -> RemoteResult<()>;

    /// Delete a document; deleting a missing document succeeds
    async fn delete(&self, user_id: &str, key: &str) -> RemoteResult<()>;

    /// Stream changes of a document into `events`.
    ///
    /// Delivery stops once the receiving half of `events` is dropped or after a
    /// [`RemoteEvent::Failed`] has been sent.
    async fn subscribe(
        &self,
        user_id: &str,
        key: &str,
        events: mpsc::UnboundedSender<RemoteEvent>,
    ) -> RemoteResult<()>;
}
