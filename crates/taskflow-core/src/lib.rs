//! taskflow-core - Core library for TaskFlow
//!
//! Local-first jobs, projects, tasks and notes. Both collections live in a
//! durable local store and are replicated to a per-user remote document store
//! with whole-document last-writer-wins.

pub mod agenda;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod store;
pub mod sync;
pub mod util;

pub use config::{RemoteConfig, SyncConfig};
pub use error::{Error, Result};
pub use models::{CollectionKey, Collections, Job, Note, Project, Snapshot, Task};
pub use services::WorkspaceService;
pub use state::SyncStatus;
pub use sync::SyncEngine;
