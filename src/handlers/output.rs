//! Output formatting for CLI responses.
//!
//! Every command result renders either as aligned text for people or as
//! JSON (`--json`) for scripts.

use crate::models::{
    listing::ListingEntry,
    session::{BucketGrant, CurrentUser},
    upload::UploadBatchResult,
};
use chrono::{DateTime, Utc};

pub trait Outputable {
    fn to_json(&self) -> serde_json::Value;

    fn to_human(&self) -> String;
}

pub fn print_output<T: Outputable>(value: &T, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&value.to_json())
                .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize: {}\"}}", e))
        );
    } else {
        println!("{}", value.to_human());
    }
}

pub fn print_success(message: &str, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "success",
                "message": message
            })
        );
    } else {
        println!("{}", message);
    }
}

/// `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`; base 1024, at most two
/// decimals with trailing zeros dropped.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut exp = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exp < UNITS.len() - 1 {
        scaled /= 1024;
        exp += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exp])
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// One projected folder level.
pub struct ListingOutput<'a> {
    pub bucket: &'a str,
    pub prefix: String,
    pub entries: &'a [ListingEntry],
}

impl Outputable for ListingOutput<'_> {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "bucket": self.bucket,
            "prefix": self.prefix,
            "entries": self.entries,
        })
    }

    fn to_human(&self) -> String {
        let folders = self.entries.iter().filter(|e| e.is_folder).count();
        let files = self.entries.len() - folders;
        let mut out = format!(
            "{}/{}\n{} folder(s), {} file(s)",
            self.bucket, self.prefix, folders, files
        );
        if self.entries.is_empty() {
            out.push_str("\nNo files or folders in this location");
            return out;
        }

        let width = self
            .entries
            .iter()
            .map(|e| e.name.len() + usize::from(e.is_folder))
            .max()
            .unwrap_or(0)
            .max(4);
        for entry in self.entries {
            let (name, size, modified) = if entry.is_folder {
                (format!("{}/", entry.name), "-".to_string(), "-".to_string())
            } else {
                (
                    entry.name.clone(),
                    entry
                        .size
                        .map(|s| human_size(s.max(0) as u64))
                        .unwrap_or_else(|| "-".into()),
                    entry
                        .last_modified
                        .as_ref()
                        .map(timestamp)
                        .unwrap_or_else(|| "-".into()),
                )
            };
            out.push_str(&format!(
                "\n{:<width$}  {:>10}  {}",
                name,
                size,
                modified,
                width = width
            ));
        }
        out
    }
}

impl Outputable for UploadBatchResult {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "outcome": self.outcome(),
            "summary": self.summary(),
            "succeeded": self.succeeded,
            "failed": self.failed,
            "files": self.per_file,
        })
    }

    fn to_human(&self) -> String {
        let mut lines: Vec<String> = self
            .per_file
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| format!("  {}: {}", r.name, e)))
            .collect();
        lines.insert(0, self.summary());
        lines.join("\n")
    }
}

pub struct GrantsOutput(pub Vec<BucketGrant>);

impl Outputable for GrantsOutput {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.0)
    }

    fn to_human(&self) -> String {
        if self.0.is_empty() {
            return "No bucket permissions granted".into();
        }
        let flag = |on: bool, c: char| if on { c } else { '-' };
        self.0
            .iter()
            .map(|g| {
                let caps: String = [
                    flag(g.can_list, 'l'),
                    flag(g.can_read, 'r'),
                    flag(g.can_write, 'w'),
                    flag(g.can_delete, 'd'),
                ]
                .iter()
                .collect();
                let root = if g.prefix.is_empty() { "*" } else { &g.prefix };
                format!("{}  {}/{}", caps, g.bucket_name, root)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct UserOutput {
    pub user: CurrentUser,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Outputable for UserOutput {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "user": self.user,
            "session_expires_at": self.expires_at,
        })
    }

    fn to_human(&self) -> String {
        let role = if self.user.is_admin { "admin" } else { "user" };
        let mut out = format!(
            "{} <{}>\nRole:     {}\nActive:   {}",
            self.user.full_name, self.user.email, role, self.user.is_active
        );
        if let Some(last) = &self.user.last_login {
            out.push_str(&format!("\nLast login: {}", timestamp(last)));
        }
        if let Some(exp) = &self.expires_at {
            out.push_str(&format!("\nSession expires: {}", timestamp(exp)));
        }
        if self.user.must_change_password {
            out.push_str("\nYou must change your password (s3-console passwd)");
        }
        out
    }
}
