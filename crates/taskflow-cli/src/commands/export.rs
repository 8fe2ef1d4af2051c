use std::path::{Path, PathBuf};

use chrono::Utc;
use taskflow_core::export::{self, render_export, suggested_export_file_name, WorkspaceExport};
use taskflow_core::WorkspaceService;

use crate::cli::ExportFormat;
use crate::error::CliError;

impl From<ExportFormat> for export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    workspace: &WorkspaceService,
) -> Result<(), CliError> {
    let exported_at = Utc::now();
    let collections = workspace.engine().collections().await;
    let rendered = render_export(
        &WorkspaceExport::new(&collections, exported_at),
        format.into(),
    )?;

    if let Some(path) = output_path {
        let path = resolve_export_path(path, format, exported_at.timestamp_millis());
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// A directory target gets the default export file name inside it.
pub fn resolve_export_path(path: &Path, format: ExportFormat, timestamp_ms: i64) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(format.into(), timestamp_ms))
    } else {
        path.to_path_buf()
    }
}
