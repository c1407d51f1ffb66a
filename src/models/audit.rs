//! Payload of the best-effort completion notice sent to the audit sink.

use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadOutcome {
    Success,
    Failure,
}

/// Body of `POST /s3/upload-complete`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CompletionNotice {
    pub bucket_name: String,
    pub object_key: String,
    pub status: UploadOutcome,
    pub error_message: Option<String>,
}

impl CompletionNotice {
    pub fn success(bucket: &str, key: &str) -> Self {
        Self {
            bucket_name: bucket.to_string(),
            object_key: key.to_string(),
            status: UploadOutcome::Success,
            error_message: None,
        }
    }

    pub fn failure(bucket: &str, key: &str, error: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket.to_string(),
            object_key: key.to_string(),
            status: UploadOutcome::Failure,
            error_message: Some(error.into()),
        }
    }
}
