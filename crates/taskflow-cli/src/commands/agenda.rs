use taskflow_core::WorkspaceService;

use crate::commands::common::{format_agenda_lines, print_lines, resolve_day};
use crate::error::CliError;

pub async fn run_agenda(
    date: Option<&str>,
    as_json: bool,
    workspace: &WorkspaceService,
) -> Result<(), CliError> {
    let today = resolve_day(date)?;
    let agenda = workspace.agenda(today).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&agenda)?);
    } else {
        print_lines(&format_agenda_lines(&agenda));
    }
    Ok(())
}
