//! Browsing view over one bucket grant.
//!
//! Owns the navigation cursor and the entries projected for it. Every
//! navigation lists the new prefix afresh; nothing from earlier levels is
//! cached. A failed listing leaves the previous path and entries untouched so
//! the user can keep navigating and retry with `refresh`.

use crate::{
    errors::{ConsoleError, ConsoleResult},
    interfaces::{CredentialIssuer, ListingService, ObjectDeleter},
    models::{
        credential::DownloadCredential,
        listing::{ListingEntry, NavigationState},
    },
    services::hierarchy,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct BrowserView {
    bucket: String,
    listing: Arc<dyn ListingService>,
    state: NavigationState,
    entries: Vec<ListingEntry>,
    last_error: Option<String>,
}

impl BrowserView {
    /// A view positioned at the root of `root_prefix`. Nothing is listed
    /// until the first navigation or `refresh`.
    pub fn new(
        bucket: impl Into<String>,
        root_prefix: impl Into<String>,
        listing: Arc<dyn ListingService>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            listing,
            state: NavigationState::new(root_prefix),
            entries: Vec::new(),
            last_error: None,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    /// User-visible message of the most recent failure, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn breadcrumbs(&self) -> Vec<&str> {
        hierarchy::breadcrumbs(self.state.current_path())
    }

    /// Prefix new uploads land under.
    pub fn upload_destination(&self) -> String {
        self.state.full_prefix()
    }

    pub fn folder_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_folder).count()
    }

    pub fn file_count(&self) -> usize {
        self.entries.len() - self.folder_count()
    }

    /// Re-list the current location.
    pub async fn refresh(&mut self) -> ConsoleResult<()> {
        let target = self.state.clone();
        self.load(target).await
    }

    pub async fn enter_folder(&mut self, folder_name: &str) -> ConsoleResult<()> {
        let target = hierarchy::enter_folder(&self.state, folder_name)?;
        self.load(target).await
    }

    pub async fn jump_to_breadcrumb(&mut self, index: isize) -> ConsoleResult<()> {
        let target = hierarchy::jump_to_breadcrumb(&self.state, index)?;
        self.load(target).await
    }

    /// Navigate to a typed relative path, one validated segment at a time.
    pub async fn open_path(&mut self, relative: &str) -> ConsoleResult<()> {
        let target = hierarchy::resolve_path(&self.state, relative)?;
        self.load(target).await
    }

    /// Delete an object shown in this view and reload the listing.
    ///
    /// Confirmation is the caller's job. On failure the entries stay as they
    /// were; the error concerns that single object only.
    pub async fn delete(&mut self, deleter: &dyn ObjectDeleter, key: &str) -> ConsoleResult<()> {
        if let Err(err) = hierarchy::ensure_within_root(&self.state, key) {
            warn!("refusing to delete {}: {}", key, err);
            self.last_error = Some(err.user_message());
            return Err(err);
        }
        if let Err(err) = deleter.delete_object(&self.bucket, key).await {
            let err = match err {
                ConsoleError::Delete { .. } | ConsoleError::Unauthorized => err,
                other => ConsoleError::Delete {
                    key: key.to_string(),
                    reason: other.detail(),
                },
            };
            warn!("delete of {} failed: {}", key, err);
            self.last_error = Some(err.user_message());
            return Err(err);
        }
        info!("deleted {}/{}", self.bucket, key);
        self.refresh().await
    }

    /// Single-use GET credential for an object in this bucket.
    pub async fn download_credential(
        &mut self,
        issuer: &dyn CredentialIssuer,
        key: &str,
    ) -> ConsoleResult<DownloadCredential> {
        if let Err(err) = hierarchy::ensure_within_root(&self.state, key) {
            warn!("refusing to download {}: {}", key, err);
            self.last_error = Some(err.user_message());
            return Err(err);
        }
        match issuer.issue_download_credential(&self.bucket, key).await {
            Ok(cred) => Ok(cred),
            Err(err) => {
                warn!("download credential for {} failed: {}", key, err);
                self.last_error = Some("Failed to download file".into());
                Err(err)
            }
        }
    }

    /// List `target` and, only on success, make it the current location.
    async fn load(&mut self, target: NavigationState) -> ConsoleResult<()> {
        let prefix = target.full_prefix();
        debug!("listing {}/{}", self.bucket, prefix);

        let objects = match self.listing.list_objects(&self.bucket, &prefix).await {
            Ok(objects) => objects,
            Err(err) => {
                let err = match err {
                    ConsoleError::Listing { .. } | ConsoleError::Unauthorized => err,
                    other => ConsoleError::Listing {
                        prefix: prefix.clone(),
                        reason: other.detail(),
                    },
                };
                warn!("listing {} failed, keeping previous view: {}", prefix, err);
                self.last_error = Some(err.user_message());
                return Err(err);
            }
        };

        self.entries = hierarchy::project(&objects, &prefix);
        self.state = target;
        self.last_error = None;
        info!(
            "{}/{}: {} folder(s), {} file(s)",
            self.bucket,
            prefix,
            self.folder_count(),
            self.file_count()
        );
        Ok(())
    }
}
