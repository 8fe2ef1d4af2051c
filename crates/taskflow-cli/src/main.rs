//! TaskFlow CLI - jobs, projects, tasks and notes from the command line

mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use taskflow_core::WorkspaceService;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::agenda::run_agenda;
use crate::commands::common::{
    open_workspace, resolve_db_path, resolve_sync_settings, SyncSettings,
};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::export::run_export;
use crate::commands::job::run_job;
use crate::commands::note::run_note;
use crate::commands::project::run_project;
use crate::commands::sync::run_sync;
use crate::commands::task::run_task;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskflow=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
        Commands::Config { command } => run_config(command, cli.profile.as_deref(), &db_path),
        command => {
            let settings = if cli.offline {
                SyncSettings::default()
            } else {
                resolve_sync_settings(cli.profile.as_deref())?
            };
            let workspace = open_workspace(&db_path, &settings)?;
            if pulls_before_running(&command) && workspace.engine().has_remote() {
                workspace.engine().pull_remote().await;
            }

            let result = dispatch(command, &workspace).await;
            workspace.engine().settle().await;
            workspace.engine().shutdown();
            result
        }
    }
}

/// Commands that manage sync themselves skip the startup pull.
const fn pulls_before_running(command: &Commands) -> bool {
    !matches!(
        command,
        Commands::Sync {
            command: None | Some(SyncCommands::Test)
        } | Commands::Watch
    )
}

async fn dispatch(command: Commands, workspace: &WorkspaceService) -> Result<(), CliError> {
    match command {
        Commands::Job { command } => run_job(command, workspace).await,
        Commands::Project { command } => run_project(command, workspace).await,
        Commands::Task { command } => run_task(command, workspace).await,
        Commands::Note { command } => run_note(command, workspace).await,
        Commands::Agenda { date, json } => run_agenda(date.as_deref(), json, workspace).await,
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), workspace).await
        }
        Commands::Sync { command } => run_sync(command, workspace).await,
        Commands::Watch => run_watch(workspace).await,
        // Handled before a workspace is opened.
        Commands::Completions { .. } | Commands::Config { .. } => Ok(()),
    }
}
