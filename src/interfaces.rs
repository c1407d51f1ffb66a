//! Collaborator seams of the console core.
//!
//! The hierarchy projector and the upload orchestrator only ever talk to the
//! outside world through these traits. `ConsoleClient` implements all of them
//! over HTTP; tests substitute mocks or recording fakes.

use crate::{
    errors::ConsoleResult,
    models::{
        audit::CompletionNotice,
        credential::{DownloadCredential, UploadCredential},
        object::ObjectSummary,
        session::{AccessToken, CurrentUser},
        upload::LocalFile,
    },
};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;

/// Transport progress callback: `(bytes_sent, total_bytes)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Returns every key sharing a prefix. Pagination is the implementor's concern.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ListingService: Send + Sync {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> ConsoleResult<Vec<ObjectSummary>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue_upload_credential(
        &self,
        bucket: &str,
        key: &str,
    ) -> ConsoleResult<UploadCredential>;

    async fn issue_download_credential(
        &self,
        bucket: &str,
        key: &str,
    ) -> ConsoleResult<DownloadCredential>;
}

/// What the store said about a finished transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferReceipt {
    pub status: u16,
    pub etag: Option<String>,
    /// MD5 of the bytes actually sent, lowercase hex.
    pub local_md5: Option<String>,
}

/// Moves one file's bytes to the store using a pre-signed POST credential.
///
/// Implementations report progress through `on_progress` and return
/// `ConsoleError::Transfer` carrying the most specific message available
/// for any non-success status or transport error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    async fn post_object(
        &self,
        credential: &UploadCredential,
        file: &LocalFile,
        on_progress: ProgressFn,
    ) -> ConsoleResult<TransferReceipt>;
}

/// Audit sink for upload outcomes. Fire-and-forget from the core's view.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn notify(&self, notice: &CompletionNotice) -> ConsoleResult<()>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectDeleter: Send + Sync {
    async fn delete_object(&self, bucket: &str, key: &str) -> ConsoleResult<()>;
}

/// Authentication collaborator. `current_user` always hits the server; no
/// caching happens at this layer.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ConsoleResult<AccessToken>;

    async fn current_user(&self) -> ConsoleResult<CurrentUser>;

    async fn change_password(&self, current_password: &str, new_password: &str)
    -> ConsoleResult<()>;
}
