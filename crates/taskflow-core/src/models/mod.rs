//! Data models for TaskFlow

mod collection;
mod ids;
mod job;
mod note;

pub use collection::{is_empty_document, CollectionKey, Collections, Snapshot};
pub use ids::{generate_readable_id, readable_id_at, slugify, unique_readable_id};
pub use job::{Job, JobMap, Priority, Project, ProjectStatus, Task, TaskStatus};
pub use note::{FileAttachment, Note, NoteMap};
