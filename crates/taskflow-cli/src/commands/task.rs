use taskflow_core::models::{Task, TaskStatus};
use taskflow_core::services::{parse_due_date, TaskDraft};
use taskflow_core::WorkspaceService;

use crate::cli::TaskCommands;
use crate::error::CliError;

pub async fn run_task(command: TaskCommands, workspace: &WorkspaceService) -> Result<(), CliError> {
    match command {
        TaskCommands::Add {
            job_id,
            project_id,
            name,
            fields,
        } => {
            let draft = TaskDraft::new(name)
                .with_description(fields.description)
                .with_status(fields.status)
                .with_priority(fields.priority)
                .with_due_date(parse_due_date(fields.due.as_deref())?)
                .with_notes(fields.notes);
            let task = workspace.create_task(&job_id, &project_id, draft).await?;
            println!("{}", task.id);
        }
        TaskCommands::Edit {
            job_id,
            project_id,
            task_id,
            name,
            fields,
        } => {
            let current = find_task(workspace, &job_id, &project_id, &task_id).await?;
            let due_date = match fields.due.as_deref() {
                Some(due) => parse_due_date(Some(due))?,
                None => current.due_date,
            };
            let draft = TaskDraft::new(name.unwrap_or(current.name))
                .with_description(fields.description.unwrap_or(current.description))
                .with_status(fields.status.unwrap_or(current.status))
                .with_priority(fields.priority.unwrap_or(current.priority))
                .with_due_date(due_date)
                .with_notes(fields.notes.unwrap_or(current.notes));
            let task = workspace
                .update_task(&job_id, &project_id, &task_id, draft)
                .await?;
            println!("Updated task {}", task.id);
        }
        TaskCommands::Done {
            job_id,
            project_id,
            task_id,
        } => {
            let current = find_task(workspace, &job_id, &project_id, &task_id).await?;
            let draft = draft_from(current).with_status(TaskStatus::Completed);
            let task = workspace
                .update_task(&job_id, &project_id, &task_id, draft)
                .await?;
            println!("Completed {}", task.name);
        }
        TaskCommands::Rm {
            job_id,
            project_id,
            task_id,
        } => {
            let task = workspace
                .delete_task(&job_id, &project_id, &task_id)
                .await?;
            println!("Deleted task {}", task.id);
        }
    }
    Ok(())
}

async fn find_task(
    workspace: &WorkspaceService,
    job_id: &str,
    project_id: &str,
    task_id: &str,
) -> Result<Task, CliError> {
    let mut project = workspace.get_project(job_id, project_id).await?;
    project.tasks.remove(task_id).ok_or_else(|| {
        CliError::Core(taskflow_core::Error::NotFound(format!("task '{task_id}'")))
    })
}

fn draft_from(task: Task) -> TaskDraft {
    TaskDraft::new(task.name)
        .with_description(task.description)
        .with_status(task.status)
        .with_priority(task.priority)
        .with_due_date(task.due_date)
        .with_notes(task.notes)
}
