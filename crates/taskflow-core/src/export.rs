//! Workspace export as a JSON backup or a readable Markdown outline.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Collections, JobMap, NoteMap};
use crate::services::format_file_size;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Full backup of both collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceExport {
    pub exported_at: DateTime<Utc>,
    pub jobs: JobMap,
    pub notes: NoteMap,
}

impl WorkspaceExport {
    #[must_use]
    pub fn new(collections: &Collections, exported_at: DateTime<Utc>) -> Self {
        Self {
            exported_at,
            jobs: collections.jobs.clone(),
            notes: collections.notes.clone(),
        }
    }
}

/// Render the workspace as pretty-printed JSON.
pub fn render_json_export(export: &WorkspaceExport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(export)
}

/// Render jobs as a nested outline followed by notes.
#[must_use]
pub fn render_markdown_export(export: &WorkspaceExport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# TaskFlow export");
    let _ = writeln!(output);
    let _ = writeln!(output, "Exported {}", export.exported_at.to_rfc3339());

    for job in export.jobs.values() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", job.name);
        write_text_block(&mut output, &job.description);
        write_text_block(&mut output, &job.notes);

        for project in job.projects.values() {
            let _ = writeln!(output);
            let _ = write!(
                output,
                "### {} ({}, {} priority",
                project.title, project.status, project.priority
            );
            if let Some(due) = project.due_date {
                let _ = write!(output, ", due {due}");
            }
            let _ = writeln!(output, ")");
            write_text_block(&mut output, &project.description);

            if !project.tasks.is_empty() {
                let _ = writeln!(output);
            }
            for task in project.tasks.values() {
                let mark = if task.status == crate::models::TaskStatus::Completed {
                    'x'
                } else {
                    ' '
                };
                let _ = write!(output, "- [{mark}] {} ({}", task.name, task.priority);
                if let Some(due) = task.due_date {
                    let _ = write!(output, ", due {due}");
                }
                let _ = writeln!(output, ")");
            }
        }
    }

    if !export.notes.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Notes");
    }
    for note in export.notes.values() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {}", note.title);
        write_text_block(&mut output, &note.content);
        for file in &note.files {
            let _ = writeln!(
                output,
                "- attachment: {} ({}, {})",
                file.name,
                file.mime_type,
                format_file_size(file.size)
            );
        }
    }

    output
}

fn write_text_block(output: &mut String, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "{text}");
    }
}

/// Render the workspace in the selected format.
pub fn render_export(export: &WorkspaceExport, format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(export),
        ExportFormat::Markdown => Ok(render_markdown_export(export)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("taskflow-export-{timestamp_ms}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, Note, Priority, Project, ProjectStatus, Task, TaskStatus};
    use chrono::{NaiveDate, TimeZone};
    use std::collections::BTreeMap;

    fn sample() -> WorkspaceExport {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let task = Task {
            id: "task_launch_1".to_string(),
            name: "Launch".to_string(),
            description: String::new(),
            status: TaskStatus::Completed,
            priority: Priority::High,
            due_date: NaiveDate::from_ymd_opt(2024, 5, 3),
            notes: String::new(),
            created_at: at,
            updated_at: None,
        };
        let project = Project {
            id: "project_site_1".to_string(),
            title: "Site".to_string(),
            description: "Marketing site".to_string(),
            status: ProjectStatus::OnHold,
            priority: Priority::Low,
            due_date: None,
            notes: String::new(),
            tasks: BTreeMap::from([(task.id.clone(), task)]),
            created_at: at,
            updated_at: None,
        };
        let job = Job {
            id: "job_acme_1".to_string(),
            name: "Acme".to_string(),
            description: String::new(),
            notes: String::new(),
            projects: BTreeMap::from([(project.id.clone(), project)]),
            created_at: at,
            updated_at: None,
        };
        let note = Note {
            id: "note_ideas_1".to_string(),
            title: "Ideas".to_string(),
            content: "Try dark mode".to_string(),
            files: Vec::new(),
            created_at: at,
            updated_at: None,
        };

        WorkspaceExport {
            exported_at: at,
            jobs: BTreeMap::from([(job.id.clone(), job)]),
            notes: BTreeMap::from([(note.id.clone(), note)]),
        }
    }

    #[test]
    fn markdown_export_outlines_jobs_and_notes() {
        let rendered = render_markdown_export(&sample());

        assert!(rendered.starts_with("# TaskFlow export\n"));
        assert!(rendered.contains("## Acme"));
        assert!(rendered.contains("### Site (on-hold, low priority)"));
        assert!(rendered.contains("Marketing site"));
        assert!(rendered.contains("- [x] Launch (high, due 2024-05-03)"));
        assert!(rendered.contains("## Notes\n\n### Ideas\n\nTry dark mode"));
    }

    #[test]
    fn json_export_uses_wire_names() {
        let rendered = render_export(&sample(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert!(value["exportedAt"].is_string());
        assert_eq!(
            value["jobs"]["job_acme_1"]["projects"]["project_site_1"]["status"],
            "on-hold"
        );
        assert_eq!(value["notes"]["note_ideas_1"]["title"], "Ideas");
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "taskflow-export-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "taskflow-export-456.md"
        );
    }
}
