//! Note model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// All notes keyed by id. This is the `notes` collection document.
pub type NoteMap = BTreeMap<String, Note>;

/// A file attached to a note, stored inline as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    /// Original file name
    pub name: String,
    /// MIME type as reported at upload time
    #[serde(rename = "type", default)]
    pub mime_type: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// Inline-encoded content (`data:<mime>;base64,...`)
    #[serde(default)]
    pub data: String,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

impl FileAttachment {
    /// Whether the attachment can be previewed inline (images and PDFs).
    #[must_use]
    pub fn is_previewable(&self) -> bool {
        self.mime_type.starts_with("image/") || self.mime_type == "application/pdf"
    }
}

/// A free-form note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Get first line of content as a preview, truncated to `max_len` characters
    #[must_use]
    pub fn content_preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }

    /// Sum of attachment sizes in bytes
    #[must_use]
    pub fn attachment_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }
}
