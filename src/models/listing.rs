//! Rows of the projected directory view and the navigation cursor.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row in a directory-style view over flat object keys.
///
/// Folder rows are synthesized: they carry no size or timestamp and their
/// `key` always ends in `/`. `name` never contains `/`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    pub name: String,
    pub is_folder: bool,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl ListingEntry {
    pub fn folder(name: impl Into<String>, query_prefix: &str) -> Self {
        let name = name.into();
        let key = format!("{}{}/", query_prefix, name);
        Self {
            name,
            is_folder: true,
            key,
            size: None,
            last_modified: None,
        }
    }

    pub fn file(
        name: impl Into<String>,
        key: impl Into<String>,
        size: i64,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
            key: key.into(),
            size: Some(size),
            last_modified: Some(last_modified),
        }
    }
}

/// Where the user currently is inside a bucket.
///
/// `root_prefix` comes from the user's grant and is fixed for the lifetime of
/// the state. `current_path` is `""` or a `/`-terminated sequence of folder
/// names the user picked; it is only ever extended through
/// [`crate::services::hierarchy::enter_folder`] or truncated through
/// [`crate::services::hierarchy::jump_to_breadcrumb`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationState {
    root_prefix: String,
    current_path: String,
}

impl NavigationState {
    pub fn new(root_prefix: impl Into<String>) -> Self {
        Self {
            root_prefix: root_prefix.into(),
            current_path: String::new(),
        }
    }

    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Prefix sent to the listing service: root prefix plus current path.
    pub fn full_prefix(&self) -> String {
        format!("{}{}", self.root_prefix, self.current_path)
    }

    /// Same root, different path. Crate-private so paths can only be
    /// produced by the navigation functions.
    pub(crate) fn with_path(&self, current_path: String) -> Self {
        Self {
            root_prefix: self.root_prefix.clone(),
            current_path,
        }
    }
}
