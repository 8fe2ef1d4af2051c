//! Synchronized collections and their versioned snapshots

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{JobMap, NoteMap};
use crate::error::Result;

/// One of the two top-level synchronized documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKey {
    Jobs,
    Notes,
}

impl CollectionKey {
    /// Every synchronized collection, in pull order.
    pub const ALL: [Self; 2] = [Self::Jobs, Self::Notes];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jobs => "jobs",
            Self::Notes => "notes",
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "jobs" => Ok(Self::Jobs),
            "notes" => Ok(Self::Notes),
            other => Err(format!("unknown collection '{other}'")),
        }
    }
}

/// Whole-document replication payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The full collection mapping
    #[serde(default)]
    pub data: Value,
    /// Write timestamp (unix ms); higher wins
    pub version: i64,
    /// Device that produced this snapshot
    #[serde(default)]
    pub device_id: String,
}

impl Snapshot {
    #[must_use]
    pub fn new(data: Value, version: i64, device_id: impl Into<String>) -> Self {
        Self {
            data,
            version,
            device_id: device_id.into(),
        }
    }

    /// Whether this snapshot should replace a local copy at `local_version`.
    #[must_use]
    pub const fn is_newer_than(&self, local_version: i64) -> bool {
        self.version > local_version
    }
}

/// The in-memory copy of both collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collections {
    pub jobs: JobMap,
    pub notes: NoteMap,
}

impl Collections {
    /// Serialize one collection to its JSON document form.
    pub fn to_value(&self, key: CollectionKey) -> Result<Value> {
        let value = match key {
            CollectionKey::Jobs => serde_json::to_value(&self.jobs)?,
            CollectionKey::Notes => serde_json::to_value(&self.notes)?,
        };
        Ok(value)
    }

    /// Replace one collection from a JSON document. `null` clears it.
    pub fn replace(&mut self, key: CollectionKey, data: Value) -> Result<()> {
        let data = if data.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            data
        };
        match key {
            CollectionKey::Jobs => self.jobs = serde_json::from_value(data)?,
            CollectionKey::Notes => self.notes = serde_json::from_value(data)?,
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self, key: CollectionKey) -> bool {
        match key {
            CollectionKey::Jobs => self.jobs.is_empty(),
            CollectionKey::Notes => self.notes.is_empty(),
        }
    }
}

/// Whether a raw collection document holds no records.
#[must_use]
pub fn is_empty_document(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
