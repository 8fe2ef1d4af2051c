use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use taskflow_core::models::{Priority, ProjectStatus, TaskStatus};

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "Jobs, projects, tasks and notes that work offline and sync when they can")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile to use (or initialize with `config init`)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Skip the remote store even when one is configured
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Manage projects inside a job
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage tasks inside a project
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Manage free-form notes and their attachments
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Show tasks due today and during the coming week
    Agenda {
        /// Day to treat as today (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the workspace
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Pull remote changes and flush pending writes
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Follow connectivity and remote changes until interrupted
    Watch,
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum JobCommands {
    /// Create a job
    Add {
        /// Job name
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Edit a job; omitted fields keep their value
    Edit {
        /// Job ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a job with all its projects and tasks
    #[command(alias = "delete")]
    Rm {
        /// Job ID
        id: String,
    },
    /// List jobs
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a job with its projects and tasks
    Show {
        /// Job ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project
    Add {
        /// Owning job ID
        job_id: String,
        /// Project title
        title: String,
        #[command(flatten)]
        fields: ProjectArgs,
    },
    /// Edit a project; omitted fields keep their value
    Edit {
        job_id: String,
        project_id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: ProjectEditArgs,
    },
    /// Change a single field: title, status, priority or due
    Set {
        job_id: String,
        project_id: String,
        field: String,
        /// New value; an empty due date clears it
        value: String,
    },
    /// Delete a project with its tasks
    #[command(alias = "delete")]
    Rm { job_id: String, project_id: String },
}

#[derive(clap::Args, Debug, Default)]
pub struct ProjectArgs {
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "active")]
    pub status: ProjectStatus,
    #[arg(long, default_value = "medium")]
    pub priority: Priority,
    /// Due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(clap::Args, Debug, Default)]
pub struct ProjectEditArgs {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<ProjectStatus>,
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Due date (YYYY-MM-DD); an empty value clears it
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task
    Add {
        job_id: String,
        project_id: String,
        /// Task name
        name: String,
        #[command(flatten)]
        fields: TaskArgs,
    },
    /// Edit a task; omitted fields keep their value
    Edit {
        job_id: String,
        project_id: String,
        task_id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: TaskEditArgs,
    },
    /// Mark a task completed
    Done {
        job_id: String,
        project_id: String,
        task_id: String,
    },
    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        job_id: String,
        project_id: String,
        task_id: String,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct TaskArgs {
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "not-started")]
    pub status: TaskStatus,
    #[arg(long, default_value = "medium")]
    pub priority: Priority,
    /// Due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(clap::Args, Debug, Default)]
pub struct TaskEditArgs {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<TaskStatus>,
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Due date (YYYY-MM-DD); an empty value clears it
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Create a note; content falls back to piped stdin
    #[command(alias = "new")]
    Add {
        /// Note title
        title: String,
        /// Note content
        content: Vec<String>,
    },
    /// Edit a note; omitted fields keep their value
    Edit {
        /// Note ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    #[command(alias = "delete")]
    Rm {
        /// Note ID
        id: String,
    },
    /// List notes, most recently changed first
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Attach a file (up to 5 MB) to a note
    Attach {
        /// Note ID
        id: String,
        /// File to attach
        path: PathBuf,
        /// MIME type override
        #[arg(long = "type", value_name = "MIME")]
        mime_type: Option<String>,
    },
    /// Remove an attachment by its 1-based position
    Detach {
        /// Note ID
        id: String,
        /// Attachment number as shown by `note list`
        position: usize,
    },
    /// Write an attachment's content to a file
    Save {
        /// Note ID
        id: String,
        /// Attachment number as shown by `note list`
        position: usize,
        /// Output path (defaults to the attachment name)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show sync status, versions and pending writes
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write, read back and delete a probe document on the remote store
    Test,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Remote document store base URL
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
        /// Remote API key
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
        /// Remote user whose documents are synchronized
        #[arg(long, value_name = "ID")]
        user_id: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved configuration
    Show,
}
