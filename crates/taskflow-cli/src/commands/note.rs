use std::path::Path;

use taskflow_core::services::{decode_attachment, NoteDraft};
use taskflow_core::WorkspaceService;

use crate::cli::NoteCommands;
use crate::commands::common::{
    attachment_index, format_attachment_lines, format_note_lines, note_to_list_item, print_lines,
    resolve_note_content, NoteListItem,
};
use crate::error::CliError;

pub async fn run_note(command: NoteCommands, workspace: &WorkspaceService) -> Result<(), CliError> {
    match command {
        NoteCommands::Add { title, content } => {
            let content = match resolve_note_content(&content) {
                Ok(content) => content,
                Err(CliError::EmptyContent) => String::new(),
                Err(error) => return Err(error),
            };
            let note = workspace.create_note(NoteDraft::new(title, content)).await?;
            println!("{}", note.id);
        }
        NoteCommands::Edit { id, title, content } => {
            let current = workspace.get_note(&id).await?;
            let draft = NoteDraft::new(
                title.unwrap_or(current.title),
                content.unwrap_or(current.content),
            );
            let note = workspace.update_note(&id, draft).await?;
            println!("Updated note {}", note.id);
        }
        NoteCommands::Rm { id } => {
            let note = workspace.delete_note(&id).await?;
            println!("Deleted note {}", note.id);
        }
        NoteCommands::List { limit, json } => run_note_list(limit, json, workspace).await?,
        NoteCommands::Attach {
            id,
            path,
            mime_type,
        } => run_note_attach(&id, &path, mime_type.as_deref(), workspace).await?,
        NoteCommands::Detach { id, position } => {
            let removed = workspace
                .remove_file(&id, attachment_index(position)?)
                .await?;
            println!("Removed {} from {id}", removed.name);
        }
        NoteCommands::Save {
            id,
            position,
            output,
        } => {
            let note = workspace.get_note(&id).await?;
            let index = attachment_index(position)?;
            let Some(attachment) = note.files.get(index) else {
                return Err(CliError::Core(taskflow_core::Error::NotFound(format!(
                    "attachment #{position} on note '{id}' ({} attached)",
                    note.files.len()
                ))));
            };
            let bytes = decode_attachment(attachment)?;
            let output = output.unwrap_or_else(|| attachment.name.clone().into());
            std::fs::write(&output, bytes)?;
            println!("{}", output.display());
        }
    }
    Ok(())
}

async fn run_note_list(
    limit: usize,
    as_json: bool,
    workspace: &WorkspaceService,
) -> Result<(), CliError> {
    let mut notes = workspace.list_notes().await;
    notes.truncate(limit);

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes yet. Create one with `taskflow note add <title> [content]`.");
        return Ok(());
    }
    for (line, note) in format_note_lines(&notes).iter().zip(&notes) {
        println!("{line}");
        print_lines(&format_attachment_lines(note));
    }
    Ok(())
}

async fn run_note_attach(
    id: &str,
    path: &Path,
    mime_type: Option<&str>,
    workspace: &WorkspaceService,
) -> Result<(), CliError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    let attachment = workspace
        .attach_file(id, &file_name, mime_type, &bytes)
        .await?;
    println!(
        "Attached {} ({}) to {id}",
        attachment.name, attachment.mime_type
    );
    Ok(())
}
