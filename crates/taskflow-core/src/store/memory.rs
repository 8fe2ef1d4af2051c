//! In-memory local store (tests and ephemeral sessions)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::LocalStore;
use crate::error::{Error, Result};

/// Volatile `LocalStore` backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryLocalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating an exhausted storage quota.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_entry(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Database("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set_entry(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database("storage quota exceeded".to_string()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Database("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
