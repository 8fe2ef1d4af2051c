use chrono::{NaiveDate, TimeZone, Utc};
use clap::{CommandFactory, Parser};
use pretty_assertions::assert_eq;
use taskflow_core::agenda::Agenda;
use taskflow_core::models::{Priority, ProjectStatus, TaskStatus};
use taskflow_core::services::{JobDraft, NoteDraft, ProjectDraft, TaskDraft};
use taskflow_core::{Note, SyncStatus, WorkspaceService};

use crate::cli::{
    Cli, Commands, CompletionShell, ExportFormat, NoteCommands, ProjectCommands, SyncCommands,
    TaskCommands,
};
use crate::commands::common::{
    attachment_index, format_agenda_lines, format_job_lines, format_job_outline,
    format_relative_time, format_timestamp, merge_sync_settings, normalize_content, note_preview,
    open_workspace, SyncSettings,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{merge_profile, validate_profile};
use crate::commands::export::resolve_export_path;
use crate::commands::note::run_note;
use crate::commands::sync::{format_sync_status_lines, run_sync, run_sync_now, sync_status_report};
use crate::commands::task::run_task;
use crate::config_profiles::CliProfile;
use crate::error::CliError;
use crate::pulls_before_running;

fn note_with_content(content: &str) -> Note {
    Note {
        id: "note_sample_1".to_string(),
        title: "Sample".to_string(),
        content: content.to_string(),
        files: Vec::new(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        updated_at: None,
    }
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parses_nested_project_set() {
    let cli = Cli::try_parse_from([
        "taskflow", "project", "set", "job_acme_1", "project_site_1", "status", "on-hold",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::Project {
            command:
                ProjectCommands::Set {
                    job_id,
                    project_id,
                    field,
                    value,
                },
        }) => {
            assert_eq!(job_id, "job_acme_1");
            assert_eq!(project_id, "project_site_1");
            assert_eq!(field, "status");
            assert_eq!(value, "on-hold");
        }
        _ => panic!("expected project set"),
    }
}

#[test]
fn parses_typed_task_flags() {
    let cli = Cli::try_parse_from([
        "taskflow",
        "--offline",
        "task",
        "add",
        "job_acme_1",
        "project_site_1",
        "Write copy",
        "--priority",
        "high",
        "--status",
        "in-progress",
        "--due",
        "2024-05-10",
    ])
    .unwrap();
    assert!(cli.offline);

    match cli.command {
        Some(Commands::Task {
            command: TaskCommands::Add { name, fields, .. },
        }) => {
            assert_eq!(name, "Write copy");
            assert_eq!(fields.priority, Priority::High);
            assert_eq!(fields.status, TaskStatus::InProgress);
            assert_eq!(fields.due.as_deref(), Some("2024-05-10"));
        }
        _ => panic!("expected task add"),
    }

    assert!(Cli::try_parse_from([
        "taskflow", "project", "add", "job_acme_1", "Site", "--status", "archived",
    ])
    .is_err());
}

#[test]
fn sync_commands_skip_the_startup_pull() {
    let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().command.unwrap();

    assert!(!pulls_before_running(&parse(&["taskflow", "sync"])));
    assert!(!pulls_before_running(&parse(&["taskflow", "sync", "test"])));
    assert!(!pulls_before_running(&parse(&["taskflow", "watch"])));
    assert!(pulls_before_running(&parse(&["taskflow", "sync", "status"])));
    assert!(pulls_before_running(&parse(&["taskflow", "job", "list"])));
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn format_timestamp_marks_unsynced_collections() {
    assert_eq!(format_timestamp(0), "never");
    assert_eq!(format_timestamp(1_714_554_000_000), "2024-05-01 09:00:00 UTC");
}

#[test]
fn note_preview_truncates_with_ellipsis() {
    let note = note_with_content("This is a very long sentence that should be shortened");
    assert_eq!(note_preview(&note, 20), "This is a very lo...");

    let note = note_with_content("  spaced   out  \nsecond line");
    assert_eq!(note_preview(&note, 40), "spaced out");
}

#[test]
fn attachment_positions_are_one_based() {
    assert_eq!(attachment_index(1).unwrap(), 0);
    assert_eq!(attachment_index(3).unwrap(), 2);
    assert!(matches!(
        attachment_index(0),
        Err(CliError::InvalidAttachmentPosition)
    ));
}

#[test]
fn environment_overrides_profile_settings() {
    let profile = CliProfile {
        remote_url: Some("https://profile.example.com".to_string()),
        api_key: Some("profile-key".to_string()),
        user_id: Some("alice".to_string()),
    };

    let settings = merge_sync_settings(
        Some(&profile),
        Some("https://env.example.com".to_string()),
        None,
        None,
    );
    let remote = settings.remote.unwrap();
    assert_eq!(remote.base_url, "https://env.example.com");
    assert_eq!(remote.api_key.as_deref(), Some("profile-key"));
    assert_eq!(settings.config.user_id, "alice");
}

#[test]
fn missing_remote_url_means_local_only() {
    let settings = merge_sync_settings(None, None, Some("key".to_string()), None);
    assert!(settings.remote.is_none());
    assert_eq!(
        settings.config.user_id,
        taskflow_core::config::ANONYMOUS_USER_ID
    );
}

#[test]
fn merge_profile_keeps_existing_values() {
    let mut profile = CliProfile {
        remote_url: Some("https://old.example.com".to_string()),
        api_key: Some("old-key".to_string()),
        user_id: None,
    };
    merge_profile(
        &mut profile,
        Some("https://new.example.com/v1/".to_string()),
        Some("  ".to_string()),
        Some("bob".to_string()),
    );

    assert_eq!(profile.remote_url.as_deref(), Some("https://new.example.com/v1"));
    assert_eq!(profile.api_key.as_deref(), Some("old-key"));
    assert_eq!(profile.user_id.as_deref(), Some("bob"));
}

#[test]
fn validate_profile_requires_http_scheme() {
    let mut profile = CliProfile {
        remote_url: Some("sync.example.com".to_string()),
        ..CliProfile::default()
    };
    assert!(matches!(
        validate_profile(&profile),
        Err(CliError::Config(_))
    ));

    profile.remote_url = Some("https://sync.example.com".to_string());
    assert!(validate_profile(&profile).is_ok());
}

#[test]
fn completions_mention_binary_name() {
    for shell in [CompletionShell::Bash, CompletionShell::Zsh, CompletionShell::Fish] {
        let script = String::from_utf8(render_completions(shell)).unwrap();
        assert!(script.contains("taskflow"));
    }
}

#[test]
fn export_into_directory_uses_suggested_name() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        resolve_export_path(dir.path(), ExportFormat::Markdown, 42),
        dir.path().join("taskflow-export-42.md")
    );

    let file = dir.path().join("backup.json");
    assert_eq!(resolve_export_path(&file, ExportFormat::Json, 42), file);
}

#[test]
fn empty_agenda_says_so() {
    let agenda = Agenda {
        today: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        ..Agenda::default()
    };
    assert_eq!(
        format_agenda_lines(&agenda),
        vec!["Nothing due in the next 7 days.".to_string()]
    );
}

#[tokio::test]
async fn job_listing_and_outline_reflect_workspace() {
    let workspace = WorkspaceService::open_in_memory();
    let job = workspace.create_job(JobDraft::new("Acme Corp")).await.unwrap();
    let project = workspace
        .create_project(
            &job.id,
            ProjectDraft::new("Website")
                .with_status(ProjectStatus::OnHold)
                .with_priority(Priority::High),
        )
        .await
        .unwrap();
    workspace
        .create_task(
            &job.id,
            &project.id,
            TaskDraft::new("Launch").with_status(TaskStatus::Completed),
        )
        .await
        .unwrap();
    workspace
        .create_task(&job.id, &project.id, TaskDraft::new("Polish"))
        .await
        .unwrap();

    let jobs = workspace.list_jobs().await;
    let lines = format_job_lines(&jobs);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(&job.id));
    assert!(lines[0].contains("1 projects, 1/2 tasks"));

    let outline = format_job_outline(&jobs[0]);
    assert_eq!(outline[0], format!("Acme Corp ({})", job.id));
    assert!(outline[1].contains("Website"));
    assert!(outline[1].contains("on-hold, high priority"));
    assert!(outline.iter().any(|line| line.contains("[x] Launch")));
    assert!(outline.iter().any(|line| line.contains("[ ] Polish")));
}

#[tokio::test]
async fn task_done_keeps_other_fields() {
    let workspace = WorkspaceService::open_in_memory();
    let job = workspace.create_job(JobDraft::new("Acme")).await.unwrap();
    let project = workspace
        .create_project(&job.id, ProjectDraft::new("Site"))
        .await
        .unwrap();
    let due = NaiveDate::from_ymd_opt(2024, 5, 10);
    let task = workspace
        .create_task(
            &job.id,
            &project.id,
            TaskDraft::new("Ship")
                .with_priority(Priority::High)
                .with_due_date(due),
        )
        .await
        .unwrap();

    run_task(
        TaskCommands::Done {
            job_id: job.id.clone(),
            project_id: project.id.clone(),
            task_id: task.id.clone(),
        },
        &workspace,
    )
    .await
    .unwrap();

    let project = workspace.get_project(&job.id, &project.id).await.unwrap();
    let done = &project.tasks[&task.id];
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.priority, Priority::High);
    assert_eq!(done.due_date, due);
    assert!(done.updated_at.is_some());
}

#[tokio::test]
async fn task_edit_reports_unknown_task() {
    let workspace = WorkspaceService::open_in_memory();
    let job = workspace.create_job(JobDraft::new("Acme")).await.unwrap();
    let project = workspace
        .create_project(&job.id, ProjectDraft::new("Site"))
        .await
        .unwrap();

    let result = run_task(
        TaskCommands::Done {
            job_id: job.id,
            project_id: project.id,
            task_id: "task_missing_1".to_string(),
        },
        &workspace,
    )
    .await;
    assert!(matches!(
        result,
        Err(CliError::Core(taskflow_core::Error::NotFound(_)))
    ));
}

#[tokio::test]
async fn note_attach_save_and_detach() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("plan.txt");
    std::fs::write(&source, b"step one").unwrap();

    let workspace = WorkspaceService::open_in_memory();
    let note = workspace
        .create_note(NoteDraft::new("Plan", "Draft"))
        .await
        .unwrap();

    run_note(
        NoteCommands::Attach {
            id: note.id.clone(),
            path: source,
            mime_type: None,
        },
        &workspace,
    )
    .await
    .unwrap();
    let attached = workspace.get_note(&note.id).await.unwrap();
    assert_eq!(attached.files.len(), 1);
    assert_eq!(attached.files[0].name, "plan.txt");
    assert_eq!(attached.files[0].mime_type, "text/plain");

    let copy = dir.path().join("copy.txt");
    run_note(
        NoteCommands::Save {
            id: note.id.clone(),
            position: 1,
            output: Some(copy.clone()),
        },
        &workspace,
    )
    .await
    .unwrap();
    assert_eq!(std::fs::read(&copy).unwrap(), b"step one");

    run_note(
        NoteCommands::Detach {
            id: note.id.clone(),
            position: 1,
        },
        &workspace,
    )
    .await
    .unwrap();
    assert!(workspace.get_note(&note.id).await.unwrap().files.is_empty());

    let missing = run_note(
        NoteCommands::Detach {
            id: note.id,
            position: 1,
        },
        &workspace,
    )
    .await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn note_edit_keeps_omitted_fields() {
    let workspace = WorkspaceService::open_in_memory();
    let note = workspace
        .create_note(NoteDraft::new("Ideas", "Dark mode"))
        .await
        .unwrap();

    run_note(
        NoteCommands::Edit {
            id: note.id.clone(),
            title: None,
            content: Some("Dark mode and offline banner".to_string()),
        },
        &workspace,
    )
    .await
    .unwrap();

    let edited = workspace.get_note(&note.id).await.unwrap();
    assert_eq!(edited.title, "Ideas");
    assert_eq!(edited.content, "Dark mode and offline banner");
}

#[tokio::test]
async fn sync_requires_remote_configuration() {
    let workspace = WorkspaceService::open_in_memory();

    assert!(matches!(
        run_sync_now(&workspace).await,
        Err(CliError::SyncNotConfigured)
    ));
    assert!(matches!(
        run_sync(Some(SyncCommands::Test), &workspace).await,
        Err(CliError::SyncNotConfigured)
    ));
}

#[tokio::test]
async fn sync_status_reports_local_only_workspace() {
    let workspace = WorkspaceService::open_in_memory();
    workspace.create_job(JobDraft::new("Acme")).await.unwrap();

    let report = sync_status_report(&workspace).await;
    assert_eq!(report.status, SyncStatus::Offline);
    assert!(!report.remote_configured);
    assert_eq!(report.pending_writes, 0);
    assert_eq!(report.collections[0].items, 1);
    assert_eq!(report.collections[1].items, 0);
    assert_eq!(report.collections[1].version_iso, "never");

    let lines = format_sync_status_lines(&report);
    assert_eq!(lines[0], "status:   offline (local-only)");
    assert!(lines.iter().any(|line| line.starts_with("jobs:     1 items")));
}

#[tokio::test]
async fn workspace_on_disk_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("taskflow.db");
    let settings = SyncSettings::default();

    let job_id = {
        let workspace = open_workspace(&db_path, &settings).unwrap();
        let job = workspace.create_job(JobDraft::new("Acme")).await.unwrap();
        workspace.engine().settle().await;
        job.id
    };

    let reopened = open_workspace(&db_path, &settings).unwrap();
    assert_eq!(reopened.get_job(&job_id).await.unwrap().name, "Acme");
}
