//! Identity and grant records returned by the console API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer token returned by `/auth/login`.
#[derive(Deserialize, Clone, Debug)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// The authenticated user as reported by `/auth/me`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    pub is_admin: bool,
    /// Set by an administrator; the user must change password before
    /// doing anything else.
    #[serde(default)]
    pub must_change_password: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// One bucket/prefix permission held by the current user.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BucketGrant {
    pub bucket_name: String,
    /// Root prefix the user is confined to; `""` means the whole bucket.
    #[serde(default)]
    pub prefix: String,
    pub can_read: bool,
    pub can_write: bool,
    pub can_delete: bool,
    pub can_list: bool,
    #[serde(default)]
    pub description: Option<String>,
}
