//! Error taxonomy for the console client.
//!
//! Every failure is scoped to the single operation (or single file) that
//! produced it. `ConsoleError::user_message` is what the CLI shows; the
//! `Display` text carries the diagnostic detail and goes to the logs.

use std::io;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("failed to list objects under `{prefix}`: {reason}")]
    Listing { prefix: String, reason: String },
    #[error("credential issuance failed for `{key}`: {reason}")]
    Credential { key: String, reason: String },
    #[error("transfer of `{key}` failed: {reason}")]
    Transfer { key: String, reason: String },
    #[error("completion notice for `{key}` failed: {reason}")]
    Notification { key: String, reason: String },
    #[error("failed to delete `{key}`: {reason}")]
    Delete { key: String, reason: String },
    #[error("invalid folder name `{0}`")]
    InvalidFolderName(String),
    #[error("`{key}` is outside the permitted prefix `{root}`")]
    OutsideRoot { key: String, root: String },
    #[error("breadcrumb index {index} is outside the current path (depth {depth})")]
    BreadcrumbOutOfRange { index: isize, depth: usize },
    #[error("upload task {0} not found")]
    TaskNotFound(Uuid),
    #[error("upload task `{name}` is {status} and cannot be removed")]
    TaskNotRemovable { name: String, status: String },
    #[error("no files pending upload")]
    NoPendingFiles,
    #[error("new password rejected: {0}")]
    InvalidPassword(&'static str),
    #[error("session expired or token rejected")]
    Unauthorized,
    #[error("console API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

impl ConsoleError {
    /// Short, non-leaking text for display.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Listing { .. } => "Failed to load files".into(),
            ConsoleError::Credential { .. } => "Credential issuance failed".into(),
            ConsoleError::Transfer { reason, .. } => reason.clone(),
            ConsoleError::Notification { .. } => "Failed to record upload status".into(),
            ConsoleError::Delete { .. } => "Failed to delete file".into(),
            ConsoleError::InvalidFolderName(name) => format!("Invalid folder name: {}", name),
            ConsoleError::OutsideRoot { .. } => "Not permitted outside your folder".into(),
            ConsoleError::BreadcrumbOutOfRange { .. } => "No such location".into(),
            ConsoleError::TaskNotFound(_) => "File is not in the upload list".into(),
            ConsoleError::TaskNotRemovable { name, .. } => {
                format!("{} can no longer be removed", name)
            }
            ConsoleError::NoPendingFiles => "Select at least one file to upload".into(),
            ConsoleError::InvalidPassword(reason) => (*reason).into(),
            ConsoleError::Unauthorized => "Your session has expired, please log in again".into(),
            ConsoleError::Api { message, .. } => message.clone(),
            ConsoleError::Http(_) => "Could not reach the server".into(),
            ConsoleError::Io(_) => "Local file error".into(),
            ConsoleError::Json(_) => "Unexpected response from server".into(),
        }
    }

    /// Reason text suitable for storing on a failed upload task.
    pub fn detail(&self) -> String {
        match self {
            ConsoleError::Listing { reason, .. }
            | ConsoleError::Credential { reason, .. }
            | ConsoleError::Transfer { reason, .. }
            | ConsoleError::Notification { reason, .. }
            | ConsoleError::Delete { reason, .. } => reason.clone(),
            ConsoleError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ConsoleError::Unauthorized)
    }
}
