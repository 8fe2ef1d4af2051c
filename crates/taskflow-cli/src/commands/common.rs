use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use taskflow_core::agenda::{Agenda, TaskRef};
use taskflow_core::models::TaskStatus;
use taskflow_core::remote::{HttpRemoteStore, RemoteStore};
use taskflow_core::services::format_file_size;
use taskflow_core::{Job, Note, RemoteConfig, SyncConfig, WorkspaceService};

use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct JobListItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub projects: usize,
    pub tasks: usize,
    pub completed_tasks: usize,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub files: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

/// Remote and engine settings after merging environment and profile.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    pub remote: Option<RemoteConfig>,
    pub config: SyncConfig,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("TASKFLOW_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskflow")
        .join("taskflow.db")
}

/// Environment variables win over the selected profile.
pub fn resolve_sync_settings(profile_name: Option<&str>) -> Result<SyncSettings, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    Ok(merge_sync_settings(
        config.profile(&profile_name),
        normalize_text_option(env::var("TASKFLOW_REMOTE_URL").ok()),
        normalize_text_option(env::var("TASKFLOW_API_KEY").ok()),
        normalize_text_option(env::var("TASKFLOW_USER_ID").ok()),
    ))
}

pub fn merge_sync_settings(
    profile: Option<&CliProfile>,
    env_remote_url: Option<String>,
    env_api_key: Option<String>,
    env_user_id: Option<String>,
) -> SyncSettings {
    let profile = profile.cloned().unwrap_or_default();
    let merged = CliProfile {
        remote_url: env_remote_url.or(profile.remote_url),
        api_key: env_api_key.or(profile.api_key),
        user_id: env_user_id.or(profile.user_id),
    };

    let mut config = SyncConfig::default();
    if let Some(user_id) = merged.user_id() {
        config = config.with_user_id(user_id);
    }

    SyncSettings {
        remote: merged.remote_config(),
        config,
    }
}

pub fn build_remote_store(
    settings: &SyncSettings,
) -> Result<Option<Arc<dyn RemoteStore>>, CliError> {
    let Some(remote) = settings.remote.as_ref() else {
        return Ok(None);
    };
    let store = HttpRemoteStore::new(remote, settings.config.subscription_poll_interval)?;
    tracing::debug!("Remote sync enabled against {}", remote.base_url);
    Ok(Some(Arc::new(store)))
}

pub fn open_workspace(db_path: &Path, settings: &SyncSettings) -> Result<WorkspaceService, CliError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let remote = build_remote_store(settings)?;
    Ok(WorkspaceService::open_path(
        db_path,
        remote,
        settings.config.clone(),
    )?)
}

pub fn format_job_lines(jobs: &[Job]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    jobs.iter()
        .map(|job| {
            let relative_time =
                format_relative_time(last_changed_ms(job.created_at, job.updated_at), now_ms);
            let progress = format!(
                "{} projects, {}/{} tasks",
                job.projects.len(),
                completed_task_count(job),
                job.task_count()
            );
            format!("{:<34}  {:<24}  {progress:<24}  {relative_time}", job.id, job.name)
        })
        .collect()
}

pub fn job_to_list_item(job: &Job) -> JobListItem {
    let now_ms = Utc::now().timestamp_millis();
    let updated_at = last_changed_ms(job.created_at, job.updated_at);
    JobListItem {
        id: job.id.clone(),
        name: job.name.clone(),
        description: job.description.clone(),
        projects: job.projects.len(),
        tasks: job.task_count(),
        completed_tasks: completed_task_count(job),
        created_at: job.created_at.timestamp_millis(),
        updated_at,
        relative_time: format_relative_time(updated_at, now_ms),
    }
}

fn completed_task_count(job: &Job) -> usize {
    job.projects
        .values()
        .map(taskflow_core::Project::completed_task_count)
        .sum()
}

/// Indented job → project → task outline.
pub fn format_job_outline(job: &Job) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", job.name, job.id)];
    push_text(&mut lines, "  ", &job.description);
    push_text(&mut lines, "  ", &job.notes);

    if job.projects.is_empty() {
        lines.push("  No projects yet.".to_string());
    }
    for project in job.projects.values() {
        let mut heading = format!(
            "  * {} [{}] {}, {} priority",
            project.title, project.id, project.status, project.priority
        );
        if let Some(due) = project.due_date {
            heading.push_str(&format!(", due {due}"));
        }
        lines.push(heading);
        push_text(&mut lines, "      ", &project.description);

        for task in project.tasks.values() {
            let mark = if task.status == TaskStatus::Completed {
                'x'
            } else {
                ' '
            };
            let mut line = format!(
                "      [{mark}] {} [{}] {}, {}",
                task.name, task.id, task.status, task.priority
            );
            if let Some(due) = task.due_date {
                line.push_str(&format!(", due {due}"));
            }
            lines.push(line);
        }
    }
    lines
}

fn push_text(lines: &mut Vec<String>, indent: &str, text: &str) {
    for line in text.trim().lines() {
        lines.push(format!("{indent}{line}"));
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let relative_time =
                format_relative_time(last_changed_ms(note.created_at, note.updated_at), now_ms);
            let title = truncate_chars(&note.title, 24);
            let preview = note_preview(note, 40);
            let mut line = format!(
                "{:<34}  {title:<24}  {preview:<40}  {relative_time}",
                note.id
            );
            if !note.files.is_empty() {
                line.push_str(&format!(
                    "  [{} files, {}]",
                    note.files.len(),
                    format_file_size(note.attachment_bytes())
                ));
            }
            line
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    let updated_at = last_changed_ms(note.created_at, note.updated_at);
    NoteListItem {
        id: note.id.clone(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        files: note.files.iter().map(|file| file.name.clone()).collect(),
        created_at: note.created_at.timestamp_millis(),
        updated_at,
        relative_time: format_relative_time(updated_at, now_ms),
    }
}

/// Numbered attachment list for a single note.
pub fn format_attachment_lines(note: &Note) -> Vec<String> {
    note.files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            format!(
                "{:>3}. {}  ({}, {})",
                index + 1,
                file.name,
                file.mime_type,
                format_file_size(file.size)
            )
        })
        .collect()
}

pub fn format_agenda_lines(agenda: &Agenda) -> Vec<String> {
    if agenda.is_empty() {
        return vec!["Nothing due in the next 7 days.".to_string()];
    }

    let mut lines = vec![format!("Due today ({})", agenda.today)];
    if agenda.due_today.is_empty() {
        lines.push("  nothing".to_string());
    }
    lines.extend(agenda.due_today.iter().map(|task| format!("  {}", format_task_ref(task))));

    lines.push("This week".to_string());
    if agenda.this_week.is_empty() {
        lines.push("  nothing".to_string());
    }
    lines.extend(agenda.this_week.iter().map(|task| {
        let due = task
            .task
            .due_date
            .map_or_else(String::new, |due| due.to_string());
        format!("  {due}  {}", format_task_ref(task))
    }));
    lines
}

fn format_task_ref(task: &TaskRef) -> String {
    format!(
        "[{}] {}  {} / {}  ({})",
        task.task.priority, task.task.name, task.job_name, task.project_title, task.task.id
    )
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = text.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn last_changed_ms(created_at: DateTime<Utc>, updated_at: Option<DateTime<Utc>>) -> i64 {
    updated_at.unwrap_or(created_at).timestamp_millis()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    if timestamp_ms <= 0 {
        return "never".to_string();
    }
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Day given on the command line, or today in local time.
pub fn resolve_day(date: Option<&str>) -> Result<NaiveDate, CliError> {
    Ok(taskflow_core::services::parse_due_date(date)?
        .unwrap_or_else(|| chrono::Local::now().date_naive()))
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Convert a 1-based attachment number to an index.
pub const fn attachment_index(position: usize) -> Result<usize, CliError> {
    match position.checked_sub(1) {
        Some(index) => Ok(index),
        None => Err(CliError::InvalidAttachmentPosition),
    }
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
