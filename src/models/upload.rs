//! Upload session state: local files, per-file tasks and batch results.

use serde::Serialize;
use std::{
    fmt, io,
    path::{Path, PathBuf},
};
use uuid::Uuid;

/// A local file selected for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    /// Path on the local filesystem.
    pub path: PathBuf,

    /// Bare file name; appended to the destination prefix to form the key.
    pub name: String,

    /// Size in bytes at selection time.
    pub size: u64,
}

impl LocalFile {
    /// Stat `path` and capture its name and size.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", path.display()),
                )
            })?
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: meta.len(),
        })
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Succeeded | UploadStatus::Failed)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UploadStatus::Pending => "pending",
            UploadStatus::InProgress => "in progress",
            UploadStatus::Succeeded => "succeeded",
            UploadStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One file's journey through the upload pipeline.
#[derive(Clone, Debug)]
pub struct UploadTask {
    pub id: Uuid,
    pub file: LocalFile,
    pub destination_key: String,
    pub status: UploadStatus,
    /// 0..=100, never decreases during a transfer.
    pub progress_percent: u8,
    pub error_detail: Option<String>,
    /// ETag returned by the store, if any.
    pub etag: Option<String>,
}

impl UploadTask {
    pub fn new(file: LocalFile, destination_prefix: &str) -> Self {
        let destination_key = format!("{}{}", destination_prefix, file.name);
        Self {
            id: Uuid::new_v4(),
            file,
            destination_key,
            status: UploadStatus::Pending,
            progress_percent: 0,
            error_detail: None,
            etag: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }
}

/// Terminal outcome of one file, as reported in the batch result.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Succeeded,
    Failed,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub key: String,
    pub outcome: FileOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate classification of a finished batch.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    Success,
    PartialSuccess,
    Failure,
}

/// Result of one `upload` invocation. Built only after every task is terminal.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadBatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub per_file: Vec<FileReport>,
}

impl UploadBatchResult {
    pub(crate) fn from_reports(per_file: Vec<FileReport>) -> Self {
        let succeeded = per_file
            .iter()
            .filter(|r| r.outcome == FileOutcome::Succeeded)
            .count();
        let failed = per_file.len() - succeeded;
        Self {
            succeeded,
            failed,
            per_file,
        }
    }

    pub fn outcome(&self) -> BatchOutcome {
        match (self.succeeded, self.failed) {
            (_, 0) => BatchOutcome::Success,
            (0, _) => BatchOutcome::Failure,
            _ => BatchOutcome::PartialSuccess,
        }
    }

    /// Only a fully successful batch asks the host to reload its listing.
    pub fn should_refresh_listing(&self) -> bool {
        self.outcome() == BatchOutcome::Success
    }

    /// Count-based summary line for the user.
    pub fn summary(&self) -> String {
        match self.outcome() {
            BatchOutcome::Success => {
                format!("All {} file(s) uploaded successfully!", self.succeeded)
            }
            BatchOutcome::Failure => format!("Failed to upload all {} file(s).", self.failed),
            BatchOutcome::PartialSuccess => format!(
                "Uploaded {} file(s), but {} failed.",
                self.succeeded, self.failed
            ),
        }
    }
}
