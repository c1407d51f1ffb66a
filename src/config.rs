use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{env, path::PathBuf, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_url: String,
    pub api_prefix: String,
    pub token: Option<String>,
    pub bucket: Option<String>,
    /// Root prefix of the grant; `None` means "take it from my grants".
    pub prefix: Option<String>,
    pub connect_timeout: Duration,
    pub json: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Browse and upload to S3 buckets through the access console")]
pub struct Args {
    /// Console server URL (overrides S3_CONSOLE_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// API path prefix (overrides S3_CONSOLE_API_PREFIX)
    #[arg(long, global = true)]
    pub api_prefix: Option<String>,

    /// Bearer token (overrides S3_CONSOLE_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Bucket to operate on (overrides S3_CONSOLE_BUCKET)
    #[arg(long, short, global = true)]
    pub bucket: Option<String>,

    /// Root prefix inside the bucket (overrides S3_CONSOLE_PREFIX)
    #[arg(long, short, global = true)]
    pub prefix: Option<String>,

    /// Connect timeout in seconds (overrides S3_CONSOLE_CONNECT_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub connect_timeout: Option<u64>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List one folder level
    Ls {
        /// Folder path relative to the root prefix
        #[arg(default_value = "")]
        path: String,
    },
    /// Upload local files into a folder
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Destination folder relative to the root prefix
        #[arg(long, default_value = "")]
        to: String,
    },
    /// Download an object to a local file
    Download {
        path: String,
        /// Local destination (defaults to the object's name)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print a pre-signed download URL
    Url { path: String },
    /// Delete an object
    Rm {
        path: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the buckets and prefixes you may access
    Grants,
    /// Obtain an access token
    Login {
        #[arg(long)]
        email: String,
        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },
    /// Show the authenticated user
    Whoami,
    /// Change your password
    Passwd,
    /// Check that the console server is up
    Health,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        // Parse CLI once
        let args = Args::parse();
        Self::merge(args)
    }

    pub fn merge(args: Args) -> Result<(Self, Command)> {
        // --- Environment fallback ---
        let env_url = env::var("S3_CONSOLE_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        let env_prefix_api =
            env::var("S3_CONSOLE_API_PREFIX").unwrap_or_else(|_| "/api/v1".into());
        let env_timeout = match env::var("S3_CONSOLE_CONNECT_TIMEOUT_SECS") {
            Ok(value) => value.parse::<u64>().with_context(|| {
                format!("parsing S3_CONSOLE_CONNECT_TIMEOUT_SECS value `{}`", value)
            })?,
            Err(env::VarError::NotPresent) => 10,
            Err(err) => return Err(err).context("reading S3_CONSOLE_CONNECT_TIMEOUT_SECS"),
        };

        // --- Merge ---
        let cfg = Self {
            server_url: args.url.unwrap_or(env_url),
            api_prefix: args.api_prefix.unwrap_or(env_prefix_api),
            token: args.token.or_else(|| non_empty_env("S3_CONSOLE_TOKEN")),
            bucket: args.bucket.or_else(|| non_empty_env("S3_CONSOLE_BUCKET")),
            prefix: args
                .prefix
                .or_else(|| env::var("S3_CONSOLE_PREFIX").ok())
                .map(normalize_prefix),
            connect_timeout: Duration::from_secs(args.connect_timeout.unwrap_or(env_timeout)),
            json: args.json,
        };

        Ok((cfg, args.command))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// `"team"` and `"/team/"` both become `"team/"`; blank stays blank.
pub fn normalize_prefix(prefix: String) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}
