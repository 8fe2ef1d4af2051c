//! Jobs, projects, tasks and notes on top of the sync engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::attachments::encode_attachment;
use super::drafts::{require_text, JobDraft, NoteDraft, ProjectDraft, ProjectField, TaskDraft};
use crate::agenda::{build_agenda, tasks_due_on, Agenda, TaskRef};
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{
    unique_readable_id, CollectionKey, FileAttachment, Job, JobMap, Note, Project, Task,
};
use crate::remote::RemoteStore;
use crate::store::{MemoryLocalStore, SqliteLocalStore};
use crate::sync::SyncEngine;

/// The data-access surface front ends call.
///
/// Every mutation persists the affected collection through the engine, which
/// pushes it to the remote store in the background.
#[derive(Clone, Debug)]
pub struct WorkspaceService {
    engine: SyncEngine,
}

impl WorkspaceService {
    pub const fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    /// Open a workspace backed by the `SQLite` store at `db_path`.
    ///
    /// A file that is not a database is moved aside and a fresh one created.
    pub fn open_path(
        db_path: impl Into<PathBuf>,
        remote: Option<Arc<dyn RemoteStore>>,
        config: SyncConfig,
    ) -> Result<Self> {
        let db_path = db_path.into();
        let local = Self::open_local_store(&db_path)?;
        if remote.is_none() {
            tracing::info!("Running in local-only mode (no remote configured)");
        }
        Ok(Self::new(SyncEngine::new(Arc::new(local), remote, config)))
    }

    /// Local-only workspace that forgets everything on drop (tests, demos).
    pub fn open_in_memory() -> Self {
        Self::new(SyncEngine::local_only(Arc::new(MemoryLocalStore::new())))
    }

    fn open_local_store(db_path: &Path) -> Result<SqliteLocalStore> {
        match SqliteLocalStore::open(db_path) {
            Ok(store) => Ok(store),
            Err(error) if is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local store at {} is unreadable: {error}. Moving it aside and starting fresh.",
                    db_path.display()
                );
                quarantine_corrupted_db_file(db_path)?;
                SqliteLocalStore::open(db_path)
            }
            Err(error) => Err(error),
        }
    }

    pub const fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    // Jobs

    /// All jobs, oldest first.
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.engine
            .read(|collections| {
                let mut jobs: Vec<_> = collections.jobs.values().cloned().collect();
                jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                jobs
            })
            .await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        self.engine
            .read(|collections| job(&collections.jobs, job_id).cloned())
            .await
    }

    pub async fn create_job(&self, draft: JobDraft) -> Result<Job> {
        let name = require_text(&draft.name, "job name")?;
        let job = self
            .engine
            .update(CollectionKey::Jobs, |collections| {
                let jobs = &mut collections.jobs;
                let id = unique_readable_id("job", &name, |id| jobs.contains_key(id));
                let job = Job {
                    id: id.clone(),
                    name,
                    description: draft.description,
                    notes: draft.notes,
                    projects: std::collections::BTreeMap::new(),
                    created_at: Utc::now(),
                    updated_at: None,
                };
                jobs.insert(id, job.clone());
                Ok(job)
            })
            .await?;
        tracing::info!("Created job {}", job.id);
        Ok(job)
    }

    pub async fn update_job(&self, job_id: &str, draft: JobDraft) -> Result<Job> {
        let name = require_text(&draft.name, "job name")?;
        self.engine
            .update(CollectionKey::Jobs, |collections| {
                let job = job_mut(&mut collections.jobs, job_id)?;
                job.name = name;
                job.description = draft.description;
                job.notes = draft.notes;
                job.updated_at = Some(Utc::now());
                Ok(job.clone())
            })
            .await
    }

    /// Delete a job with all of its projects and tasks.
    pub async fn delete_job(&self, job_id: &str) -> Result<Job> {
        let removed = self
            .engine
            .update(CollectionKey::Jobs, |collections| {
                collections
                    .jobs
                    .remove(job_id)
                    .ok_or_else(|| not_found("job", job_id))
            })
            .await?;
        tracing::info!("Deleted job {job_id}");
        Ok(removed)
    }

    // Projects

    pub async fn get_project(&self, job_id: &str, project_id: &str) -> Result<Project> {
        self.engine
            .read(|collections| {
                let job = job(&collections.jobs, job_id)?;
                job.projects
                    .get(project_id)
                    .cloned()
                    .ok_or_else(|| not_found("project", project_id))
            })
            .await
    }

    pub async fn create_project(&self, job_id: &str, draft: ProjectDraft) -> Result<Project> {
        let title = require_text(&draft.title, "project title")?;
        self.engine
            .update(CollectionKey::Jobs, |collections| {
                let job = job_mut(&mut collections.jobs, job_id)?;
                let id = unique_readable_id("project", &title, |id| job.projects.contains_key(id));
                let project = Project {
                    id: id.clone(),
                    title,
                    description: draft.description,
                    status: draft.status,
                    priority: draft.priority,
                    due_date: draft.due_date,
                    notes: draft.notes,
                    tasks: std::collections::BTreeMap::new(),
                    created_at: Utc::now(),
                    updated_at: None,
                };
                job.projects.insert(id, project.clone());
                Ok(project)
            })
            .await
    }

    pub async fn update_project(
        &self,
        job_id: &str,
        project_id: &str,
        draft: ProjectDraft,
    ) -> Result<Project> {
        let title = require_text(&draft.title, "project title")?;
        self.engine
            .update(CollectionKey::Jobs, |collections| {
                let project = project_mut(&mut collections.jobs, job_id, project_id)?;
                project.title = title;
                project.description = draft.description;
                project.status = draft.status;
                project.priority = draft.priority;
                project.due_date = draft.due_date;
                project.notes = draft.notes;
                project.updated_at = Some(Utc::now());
                Ok(project.clone())
            })
            .await
    }

    /// Change one project field in place, leaving the rest untouched.
    pub async fn set_project_field(
        &self,
        job_id: &str,
        project_id: &str,
        field: ProjectField,
    ) -> Result<Project> {
        let field = match field {
            ProjectField::Title(title) => ProjectField::Title(require_text(&title, "project title")?),
            other => other,
        };
        self.engine
            .update(CollectionKey::Jobs, |collections| {
                let project = project_mut(&mut collections.jobs, job_id, project_id)?;
                match field {
                    ProjectField::Title(title) => project.title = title,
                    ProjectField::Status(status) => project.status = status,
                    ProjectField::Priority(priority) => project.priority = priority,
                    ProjectField::DueDate(due_date) => project.due_date = due_date,
                }
                project.updated_at = Some(Utc::now());
                Ok(project.clone())
            })
            .await
    }

    pub async fn delete_project(&self, job_id: &str, project_id: &str) -> Result<Project> {
        self.engine
            .update(CollectionKey::Jobs, |collections| {
                job_mut(&mut collections.jobs, job_id)?
                    .projects
                    .remove(project_id)
                    .ok_or_else(|| not_found("project", project_id))
            })
            .await
    }

    // Tasks

    pub async fn create_task(
        &self,
        job_id: &str,
        project_id: &str,
        draft: TaskDraft,
    ) -> Result<Task> {
        let name = require_text(&draft.name, "task name")?;
        self.engine
            .update(CollectionKey::Jobs, |collections| {
                let project = project_mut(&mut collections.jobs, job_id, project_id)?;
                let id = unique_readable_id("task", &name, |id| project.tasks.contains_key(id));
                let task = Task {
                    id: id.clone(),
                    name,
                    description: draft.description,
                    status: draft.status,
                    priority: draft.priority,
                    due_date: draft.due_date,
                    notes: draft.notes,
                    created_at: Utc::now(),
                    updated_at: None,
                };
                project.tasks.insert(id, task.clone());
                Ok(task)
            })
            .await
    }

    pub async fn update_task(
        &self,
        job_id: &str,
        project_id: &str,
        task_id: &str,
        draft: TaskDraft,
    ) -> Result<Task> {
        let name = require_text(&draft.name, "task name")?;
        self.engine
            .update(CollectionKey::Jobs, |collections| {
                let task = project_mut(&mut collections.jobs, job_id, project_id)?
                    .tasks
                    .get_mut(task_id)
                    .ok_or_else(|| not_found("task", task_id))?;
                task.name = name;
                task.description = draft.description;
                task.status = draft.status;
                task.priority = draft.priority;
                task.due_date = draft.due_date;
                task.notes = draft.notes;
                task.updated_at = Some(Utc::now());
                Ok(task.clone())
            })
            .await
    }

    pub async fn delete_task(&self, job_id: &str, project_id: &str, task_id: &str) -> Result<Task> {
        self.engine
            .update(CollectionKey::Jobs, |collections| {
                project_mut(&mut collections.jobs, job_id, project_id)?
                    .tasks
                    .remove(task_id)
                    .ok_or_else(|| not_found("task", task_id))
            })
            .await
    }

    // Notes

    /// All notes, most recently changed first.
    pub async fn list_notes(&self) -> Vec<Note> {
        self.engine
            .read(|collections| {
                let mut notes: Vec<_> = collections.notes.values().cloned().collect();
                notes.sort_by(|a, b| {
                    let a_changed = a.updated_at.unwrap_or(a.created_at);
                    let b_changed = b.updated_at.unwrap_or(b.created_at);
                    b_changed.cmp(&a_changed).then_with(|| a.id.cmp(&b.id))
                });
                notes
            })
            .await
    }

    pub async fn get_note(&self, note_id: &str) -> Result<Note> {
        self.engine
            .read(|collections| {
                collections
                    .notes
                    .get(note_id)
                    .cloned()
                    .ok_or_else(|| not_found("note", note_id))
            })
            .await
    }

    pub async fn create_note(&self, draft: NoteDraft) -> Result<Note> {
        let title = require_text(&draft.title, "note title")?;
        let note = self
            .engine
            .update(CollectionKey::Notes, |collections| {
                let notes = &mut collections.notes;
                let id = unique_readable_id("note", &title, |id| notes.contains_key(id));
                let note = Note {
                    id: id.clone(),
                    title,
                    content: draft.content,
                    files: Vec::new(),
                    created_at: Utc::now(),
                    updated_at: None,
                };
                notes.insert(id, note.clone());
                Ok(note)
            })
            .await?;
        tracing::info!("Created note {}", note.id);
        Ok(note)
    }

    /// Replace a note's title and content; attachments are kept.
    pub async fn update_note(&self, note_id: &str, draft: NoteDraft) -> Result<Note> {
        let title = require_text(&draft.title, "note title")?;
        self.engine
            .update(CollectionKey::Notes, |collections| {
                let note = note_mut(&mut collections.notes, note_id)?;
                note.title = title;
                note.content = draft.content;
                note.updated_at = Some(Utc::now());
                Ok(note.clone())
            })
            .await
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<Note> {
        self.engine
            .update(CollectionKey::Notes, |collections| {
                collections
                    .notes
                    .remove(note_id)
                    .ok_or_else(|| not_found("note", note_id))
            })
            .await
    }

    /// Attach a file to a note, stored inline as a data URL.
    pub async fn attach_file(
        &self,
        note_id: &str,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<FileAttachment> {
        let attachment = encode_attachment(file_name, content_type, bytes)?;
        self.engine
            .update(CollectionKey::Notes, |collections| {
                let note = note_mut(&mut collections.notes, note_id)?;
                note.files.push(attachment.clone());
                note.updated_at = Some(Utc::now());
                Ok(attachment)
            })
            .await
    }

    /// Remove the attachment at `index` (0-based, in list order).
    pub async fn remove_file(&self, note_id: &str, index: usize) -> Result<FileAttachment> {
        self.engine
            .update(CollectionKey::Notes, |collections| {
                let note = note_mut(&mut collections.notes, note_id)?;
                if index >= note.files.len() {
                    return Err(Error::NotFound(format!(
                        "attachment #{} on note '{note_id}' ({} attached)",
                        index + 1,
                        note.files.len()
                    )));
                }
                note.updated_at = Some(Utc::now());
                Ok(note.files.remove(index))
            })
            .await
    }

    // Queries

    pub async fn tasks_due_on(&self, date: NaiveDate) -> Vec<TaskRef> {
        self.engine
            .read(|collections| tasks_due_on(&collections.jobs, date))
            .await
    }

    pub async fn agenda(&self, today: NaiveDate) -> Agenda {
        self.engine
            .read(|collections| build_agenda(&collections.jobs, today))
            .await
    }
}

fn not_found(kind: &str, id: &str) -> Error {
    Error::NotFound(format!("{kind} '{id}'"))
}

fn job<'a>(jobs: &'a JobMap, job_id: &str) -> Result<&'a Job> {
    jobs.get(job_id).ok_or_else(|| not_found("job", job_id))
}

fn job_mut<'a>(jobs: &'a mut JobMap, job_id: &str) -> Result<&'a mut Job> {
    jobs.get_mut(job_id).ok_or_else(|| not_found("job", job_id))
}

fn project_mut<'a>(jobs: &'a mut JobMap, job_id: &str, project_id: &str) -> Result<&'a mut Project> {
    job_mut(jobs, job_id)?
        .projects
        .get_mut(project_id)
        .ok_or_else(|| not_found("project", project_id))
}

fn note_mut<'a>(notes: &'a mut crate::models::NoteMap, note_id: &str) -> Result<&'a mut Note> {
    notes.get_mut(note_id).ok_or_else(|| not_found("note", note_id))
}

fn is_corrupted_db_error(error: &Error) -> bool {
    let message = error.to_string().to_ascii_lowercase();
    message.contains("file is not a database") || message.contains("malformed")
}

fn quarantine_corrupted_db_file(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        return Ok(());
    }
    let file_name = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("taskflow.db");
    let backup_path =
        db_path.with_file_name(format!("{file_name}.corrupt-{}", Utc::now().timestamp_millis()));
    std::fs::rename(db_path, &backup_path)?;
    tracing::warn!(
        "Moved corrupted local store from {} to {}",
        db_path.display(),
        backup_path.display()
    );

    for suffix in ["-wal", "-shm"] {
        let sidecar = db_path.with_file_name(format!("{file_name}{suffix}"));
        if sidecar.exists() {
            std::fs::remove_file(&sidecar)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, ProjectStatus, TaskStatus};
    use crate::remote::MemoryRemoteStore;
    use crate::state::SyncStatus;
    use pretty_assertions::assert_eq;

    async fn workspace_with_project() -> (WorkspaceService, Job, Project) {
        let service = WorkspaceService::open_in_memory();
        let job = service.create_job(JobDraft::new("Acme Corp")).await.unwrap();
        let project = service
            .create_project(&job.id, ProjectDraft::new("Website"))
            .await
            .unwrap();
        (service, job, project)
    }

    #[tokio::test]
    async fn create_job_generates_readable_id() {
        let service = WorkspaceService::open_in_memory();
        let job = service
            .create_job(JobDraft::new("  Acme Corp!  ").with_description("Retainer"))
            .await
            .unwrap();

        assert!(job.id.starts_with("job_acme_corp_"));
        assert_eq!(job.name, "Acme Corp!");
        assert_eq!(job.description, "Retainer");
        assert!(job.projects.is_empty());
        assert_eq!(job.updated_at, None);
        assert_eq!(service.list_jobs().await, vec![job]);
    }

    #[tokio::test]
    async fn same_name_in_quick_succession_gets_distinct_ids() {
        let service = WorkspaceService::open_in_memory();
        let first = service.create_job(JobDraft::new("Acme")).await.unwrap();
        let second = service.create_job(JobDraft::new("Acme")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(service.list_jobs().await.len(), 2);
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let service = WorkspaceService::open_in_memory();
        let error = service.create_job(JobDraft::new("   ")).await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));

        let (service, job, project) = workspace_with_project().await;
        assert!(service
            .create_task(&job.id, &project.id, TaskDraft::new(""))
            .await
            .is_err());
        assert!(service
            .set_project_field(&job.id, &project.id, ProjectField::Title(" ".to_string()))
            .await
            .is_err());
        assert!(service.create_note(NoteDraft::new("", "body")).await.is_err());
    }

    #[tokio::test]
    async fn update_job_overwrites_fields_and_stamps_updated_at() {
        let (service, job, _) = workspace_with_project().await;

        let updated = service
            .update_job(&job.id, JobDraft::new("Acme Inc").with_notes("call Friday"))
            .await
            .unwrap();

        assert_eq!(updated.id, job.id);
        assert_eq!(updated.name, "Acme Inc");
        assert_eq!(updated.notes, "call Friday");
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.projects.len(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (service, job, project) = workspace_with_project().await;

        assert!(matches!(
            service.get_job("job_missing").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.delete_project(&job.id, "project_missing").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service
                .update_task(&job.id, &project.id, "task_missing", TaskDraft::new("x"))
                .await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.remove_file("note_missing", 0).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn project_and_task_lifecycle() {
        let (service, job, project) = workspace_with_project().await;
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.priority, Priority::Medium);

        let due = NaiveDate::from_ymd_opt(2024, 6, 1);
        let task = service
            .create_task(
                &job.id,
                &project.id,
                TaskDraft::new("Write copy")
                    .with_priority(Priority::High)
                    .with_due_date(due),
            )
            .await
            .unwrap();
        assert!(task.id.starts_with("task_write_copy_"));

        let task = service
            .update_task(
                &job.id,
                &project.id,
                &task.id,
                TaskDraft::new("Write copy")
                    .with_status(TaskStatus::Completed)
                    .with_due_date(due),
            )
            .await
            .unwrap();
        assert_eq!(task.priority, Priority::Medium);

        let project = service.get_project(&job.id, &project.id).await.unwrap();
        assert_eq!(project.completed_task_count(), 1);

        service
            .delete_task(&job.id, &project.id, &task.id)
            .await
            .unwrap();
        assert_eq!(service.get_job(&job.id).await.unwrap().task_count(), 0);

        service.delete_project(&job.id, &project.id).await.unwrap();
        assert!(service.get_job(&job.id).await.unwrap().projects.is_empty());
    }

    #[tokio::test]
    async fn set_project_field_changes_only_that_field() {
        let (service, job, project) = workspace_with_project().await;

        let updated = service
            .set_project_field(&job.id, &project.id, ProjectField::Status(ProjectStatus::OnHold))
            .await
            .unwrap();

        assert_eq!(updated.status, ProjectStatus::OnHold);
        assert_eq!(updated.title, project.title);
        assert_eq!(updated.priority, project.priority);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn deleting_a_job_removes_nested_records() {
        let (service, job, project) = workspace_with_project().await;
        service
            .create_task(&job.id, &project.id, TaskDraft::new("Nested"))
            .await
            .unwrap();

        let removed = service.delete_job(&job.id).await.unwrap();
        assert_eq!(removed.task_count(), 1);
        assert!(service.list_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn notes_with_attachments() {
        let service = WorkspaceService::open_in_memory();
        let note = service
            .create_note(NoteDraft::new("Groceries", "milk\neggs"))
            .await
            .unwrap();
        assert!(note.id.starts_with("note_groceries_"));

        service
            .attach_file(&note.id, "list.txt", None, b"milk")
            .await
            .unwrap();
        service
            .attach_file(&note.id, "photo.png", Some("image/png"), &[137, 80, 78, 71])
            .await
            .unwrap();

        let updated = service
            .update_note(&note.id, NoteDraft::new("Groceries", "milk"))
            .await
            .unwrap();
        assert_eq!(updated.files.len(), 2);

        let removed = service.remove_file(&note.id, 0).await.unwrap();
        assert_eq!(removed.name, "list.txt");
        let note = service.get_note(&note.id).await.unwrap();
        assert_eq!(note.files.len(), 1);
        assert!(note.files[0].is_previewable());
        assert!(service.remove_file(&note.id, 5).await.is_err());

        service.delete_note(&note.id).await.unwrap();
        assert!(service.list_notes().await.is_empty());
    }

    #[tokio::test]
    async fn list_notes_puts_recent_changes_first() {
        let service = WorkspaceService::open_in_memory();
        let older = service.create_note(NoteDraft::new("Older", "")).await.unwrap();
        let newer = service.create_note(NoteDraft::new("Newer", "")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service
            .update_note(&older.id, NoteDraft::new("Older", "edited"))
            .await
            .unwrap();

        let ids: Vec<_> = service.list_notes().await.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[tokio::test]
    async fn agenda_queries_read_the_jobs_collection() {
        let (service, job, project) = workspace_with_project().await;
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        service
            .create_task(
                &job.id,
                &project.id,
                TaskDraft::new("Ship").with_due_date(Some(today)),
            )
            .await
            .unwrap();

        assert_eq!(service.tasks_due_on(today).await.len(), 1);
        let agenda = service.agenda(today).await;
        assert_eq!(agenda.due_today[0].task.name, "Ship");
        assert_eq!(agenda.due_today[0].job_name, "Acme Corp");
    }

    #[tokio::test]
    async fn mutations_reach_the_remote_store() {
        let remote = MemoryRemoteStore::new();
        let remote_store: Arc<dyn RemoteStore> = Arc::new(remote.clone());
        let engine = SyncEngine::new(
            Arc::new(MemoryLocalStore::new()),
            Some(remote_store),
            SyncConfig::default(),
        );
        let service = WorkspaceService::new(engine);

        let job = service.create_job(JobDraft::new("Remote")).await.unwrap();
        service.engine().settle().await;

        let stored = remote.document("anonymous_user", "jobs").unwrap();
        assert!(stored.data.get(&job.id).is_some());
        assert_eq!(service.engine().status(), SyncStatus::Synced);
    }

    #[tokio::test]
    async fn sqlite_workspace_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("taskflow.db");

        let job_id = {
            let service = WorkspaceService::open_path(&db_path, None, SyncConfig::default()).unwrap();
            service.create_job(JobDraft::new("Durable")).await.unwrap().id
        };

        let reopened = WorkspaceService::open_path(&db_path, None, SyncConfig::default()).unwrap();
        assert_eq!(reopened.get_job(&job_id).await.unwrap().name, "Durable");
    }

    #[tokio::test]
    async fn corrupted_database_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("taskflow.db");
        std::fs::write(&db_path, vec![b'x'; 4096]).unwrap();

        let service = WorkspaceService::open_path(&db_path, None, SyncConfig::default()).unwrap();
        assert!(service.list_jobs().await.is_empty());

        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("taskflow.db.corrupt-")
            })
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn detects_corrupted_db_errors() {
        assert!(is_corrupted_db_error(&Error::Database(
            "file is not a database".to_string()
        )));
        assert!(!is_corrupted_db_error(&Error::InvalidInput(
            "job name must not be empty".to_string()
        )));
    }
}
