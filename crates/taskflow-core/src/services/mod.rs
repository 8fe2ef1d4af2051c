//! Application services shared by every front end.

mod attachments;
mod drafts;
mod workspace;

pub use attachments::{
    decode_attachment, encode_attachment, format_file_size, infer_mime_type, MAX_ATTACHMENT_BYTES,
};
pub use drafts::{parse_due_date, JobDraft, NoteDraft, ProjectDraft, ProjectField, TaskDraft};
pub use workspace::WorkspaceService;
