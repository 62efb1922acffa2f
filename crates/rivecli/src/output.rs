use std::io;

use anyhow::Result;
use prettytable::{Table, format::consts::FORMAT_CLEAN, row};
use rive_cache::runtime::fs::FsRiveFile;
use rive_cache::{FileLoadState, FileStatus};
use serde::Serialize;

/// The outcome of loading one file.
#[derive(Clone, Debug, Serialize)]
pub struct FileReport {
    pub src: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(src: &str, state: &FileLoadState<FsRiveFile>) -> Self {
        let header = state.file.as_ref().and_then(|file| file.header());
        let size = state
            .file
            .as_ref()
            .and_then(|file| file.data())
            .map(|data| data.len());

        FileReport {
            src: src.to_owned(),
            status: state.status,
            version: header
                .as_ref()
                .map(|h| format!("{}.{}", h.major_version, h.minor_version)),
            file_id: header.map(|h| h.file_id),
            size,
            error: state.error.as_ref().map(|e| e.to_string()),
        }
    }

    pub fn failed(&self) -> bool {
        self.status != FileStatus::Success
    }
}

pub fn print_compact(reports: &[FileReport]) {
    let mut table = Table::new();
    table.set_format(*FORMAT_CLEAN);
    table.set_titles(row![b => "Source", "Status", "Version", "File ID", "Size", "Error"]);

    for report in reports {
        table.add_row(row![
            report.src,
            report.status,
            report.version.as_deref().unwrap_or(""),
            report.file_id.map(|id| id.to_string()).unwrap_or_default(),
            report.size.map(|size| size.to_string()).unwrap_or_default(),
            report.error.as_deref().unwrap_or(""),
        ]);
    }

    table.printstd();
}

pub fn print_json(reports: &[FileReport]) -> Result<()> {
    serde_json::to_writer_pretty(io::stdout(), reports)?;
    println!();
    Ok(())
}
