use taskflow_core::services::{parse_due_date, ProjectDraft, ProjectField};
use taskflow_core::WorkspaceService;

use crate::cli::ProjectCommands;
use crate::error::CliError;

pub async fn run_project(
    command: ProjectCommands,
    workspace: &WorkspaceService,
) -> Result<(), CliError> {
    match command {
        ProjectCommands::Add {
            job_id,
            title,
            fields,
        } => {
            let draft = ProjectDraft::new(title)
                .with_description(fields.description)
                .with_status(fields.status)
                .with_priority(fields.priority)
                .with_due_date(parse_due_date(fields.due.as_deref())?)
                .with_notes(fields.notes);
            let project = workspace.create_project(&job_id, draft).await?;
            println!("{}", project.id);
        }
        ProjectCommands::Edit {
            job_id,
            project_id,
            title,
            fields,
        } => {
            let current = workspace.get_project(&job_id, &project_id).await?;
            let due_date = match fields.due.as_deref() {
                Some(due) => parse_due_date(Some(due))?,
                None => current.due_date,
            };
            let draft = ProjectDraft::new(title.unwrap_or(current.title))
                .with_description(fields.description.unwrap_or(current.description))
                .with_status(fields.status.unwrap_or(current.status))
                .with_priority(fields.priority.unwrap_or(current.priority))
                .with_due_date(due_date)
                .with_notes(fields.notes.unwrap_or(current.notes));
            let project = workspace.update_project(&job_id, &project_id, draft).await?;
            println!("Updated project {}", project.id);
        }
        ProjectCommands::Set {
            job_id,
            project_id,
            field,
            value,
        } => {
            let field = ProjectField::parse(&field, &value)?;
            let project = workspace
                .set_project_field(&job_id, &project_id, field)
                .await?;
            println!(
                "{}: {}, {} priority, due {}",
                project.title,
                project.status,
                project.priority,
                project
                    .due_date
                    .map_or_else(|| "none".to_string(), |due| due.to_string())
            );
        }
        ProjectCommands::Rm { job_id, project_id } => {
            let project = workspace.delete_project(&job_id, &project_id).await?;
            println!(
                "Deleted project {} with {} tasks",
                project.id,
                project.tasks.len()
            );
        }
    }
    Ok(())
}
