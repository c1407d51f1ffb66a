//! Represents an object (file) as reported by the listing service.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single stored object under a listed prefix.
///
/// Keys are opaque; the `/` separator only has meaning to the hierarchy
/// projection, never to the storage backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Full object key within the bucket.
    pub key: String,

    /// Size in bytes.
    pub size: i64,

    /// Timestamp when object was last modified.
    #[serde(deserialize_with = "utc_lenient")]
    pub last_modified: DateTime<Utc>,

    /// Entity tag as reported by the backend, quotes stripped.
    #[serde(default)]
    pub etag: Option<String>,
}

impl ObjectSummary {
    pub fn new(key: impl Into<String>, size: i64, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
            etag: None,
        }
    }
}

/// RFC 3339, or an offset-less ISO timestamp taken as UTC.
fn utc_lenient<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
