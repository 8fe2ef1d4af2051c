use taskflow_core::services::JobDraft;
use taskflow_core::WorkspaceService;

use crate::cli::JobCommands;
use crate::commands::common::{
    format_job_lines, format_job_outline, job_to_list_item, print_lines, JobListItem,
};
use crate::error::CliError;

pub async fn run_job(command: JobCommands, workspace: &WorkspaceService) -> Result<(), CliError> {
    match command {
        JobCommands::Add {
            name,
            description,
            notes,
        } => {
            let draft = JobDraft::new(name)
                .with_description(description)
                .with_notes(notes);
            let job = workspace.create_job(draft).await?;
            println!("{}", job.id);
        }
        JobCommands::Edit {
            id,
            name,
            description,
            notes,
        } => {
            let current = workspace.get_job(&id).await?;
            let draft = JobDraft::new(name.unwrap_or(current.name))
                .with_description(description.unwrap_or(current.description))
                .with_notes(notes.unwrap_or(current.notes));
            let job = workspace.update_job(&id, draft).await?;
            println!("Updated job {}", job.id);
        }
        JobCommands::Rm { id } => {
            let job = workspace.delete_job(&id).await?;
            println!(
                "Deleted job {} with {} projects and {} tasks",
                job.id,
                job.projects.len(),
                job.task_count()
            );
        }
        JobCommands::List { json } => run_job_list(json, workspace).await?,
        JobCommands::Show { id, json } => {
            let job = workspace.get_job(&id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                print_lines(&format_job_outline(&job));
            }
        }
    }
    Ok(())
}

async fn run_job_list(as_json: bool, workspace: &WorkspaceService) -> Result<(), CliError> {
    let jobs = workspace.list_jobs().await;

    if as_json {
        let json_items = jobs.iter().map(job_to_list_item).collect::<Vec<JobListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if jobs.is_empty() {
        println!("No jobs yet. Create one with `taskflow job add <name>`.");
    } else {
        print_lines(&format_job_lines(&jobs));
    }

    Ok(())
}
