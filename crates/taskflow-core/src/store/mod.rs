//! Durable local key-value persistence for collection documents.
//!
//! The persisted layout is five entries: a document and a version marker per
//! collection, plus the device identifier.

mod memory;
mod migrations;
mod sqlite;

pub use memory::MemoryLocalStore;
pub use sqlite::SqliteLocalStore;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::CollectionKey;
use crate::util::unix_millis_now;

const KEY_PREFIX: &str = "taskflow";
const DEVICE_ID_KEY: &str = "taskflow_device_id";

/// Storage key holding a collection document.
#[must_use]
pub fn data_key(collection: CollectionKey) -> String {
    format!("{KEY_PREFIX}_{collection}")
}

/// Storage key holding a collection's last-known version.
#[must_use]
pub fn version_key(collection: CollectionKey) -> String {
    format!("{KEY_PREFIX}_{collection}_version")
}

/// Synchronous key-value store the sync engine persists into.
///
/// Implementors only provide raw string entries; document, version and device
/// id handling is shared.
pub trait LocalStore: Send + Sync {
    /// Read a raw entry
    fn get_entry(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw entry, replacing any previous value
    fn set_entry(&self, key: &str, value: &str) -> Result<()>;

    /// Read a collection document
    fn read(&self, collection: CollectionKey) -> Result<Option<Value>> {
        self.get_entry(&data_key(collection))?
            .map(|raw| serde_json::from_str(&raw).map_err(Error::from))
            .transpose()
    }

    /// Write a collection document
    fn write(&self, collection: CollectionKey, data: &Value) -> Result<()> {
        let raw = serde_json::to_string(data)?;
        self.set_entry(&data_key(collection), &raw)
    }

    /// Last-known version of a collection, 0 when never written
    fn read_version(&self, collection: CollectionKey) -> Result<i64> {
        let Some(raw) = self.get_entry(&version_key(collection))? else {
            return Ok(0);
        };
        Ok(raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable version marker for {collection}: {raw}");
            0
        }))
    }

    /// Record the last-known version of a collection
    fn write_version(&self, collection: CollectionKey, version: i64) -> Result<()> {
        self.set_entry(&version_key(collection), &version.to_string())
    }

    /// Stable identifier for this install, generated on first use
    fn device_id(&self) -> Result<String> {
        if let Some(existing) = self.get_entry(DEVICE_ID_KEY)? {
            if !existing.trim().is_empty() {
                return Ok(existing);
            }
        }

        let device_id = generate_device_id();
        self.set_entry(DEVICE_ID_KEY, &device_id)?;
        tracing::info!("Generated new device id {device_id}");
        Ok(device_id)
    }
}

/// `device_<unix ms>_<9 random hex chars>`
pub(crate) fn generate_device_id() -> String {
    let random = Uuid::now_v7().simple().to_string();
    let tail = &random[random.len() - 9..];
    format!("device_{}_{tail}", unix_millis_now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_follow_persisted_layout() {
        assert_eq!(data_key(CollectionKey::Jobs), "taskflow_jobs");
        assert_eq!(version_key(CollectionKey::Notes), "taskflow_notes_version");
    }

    #[test]
    fn version_defaults_to_zero() {
        let store = MemoryLocalStore::new();
        assert_eq!(store.read_version(CollectionKey::Jobs).unwrap(), 0);
    }

    #[test]
    fn document_roundtrip_through_raw_entries() {
        let store = MemoryLocalStore::new();
        store.write(CollectionKey::Notes, &json!({"a": 1})).unwrap();

        assert_eq!(
            store.get_entry("taskflow_notes").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
        assert_eq!(
            store.read(CollectionKey::Notes).unwrap(),
            Some(json!({"a": 1}))
        );
        assert_eq!(store.read(CollectionKey::Jobs).unwrap(), None);
    }

    #[test]
    fn device_id_is_generated_once() {
        let store = MemoryLocalStore::new();
        let first = store.device_id().unwrap();
        let second = store.device_id().unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("device_"));
        assert_eq!(first.rsplit('_').next().unwrap().len(), 9);
    }

    #[test]
    fn garbage_version_marker_reads_as_zero() {
        let store = MemoryLocalStore::new();
        store.set_entry("taskflow_jobs_version", "NaN").unwrap();
        assert_eq!(store.read_version(CollectionKey::Jobs).unwrap(), 0);
    }
}
