//! Command handlers: each one drives a console service for a single CLI
//! command and renders its result.

pub mod browse_handlers;
pub mod health_handlers;
pub mod object_handlers;
pub mod output;
pub mod session_handlers;
pub mod upload_handlers;

use crate::{
    config::AppConfig,
    errors::ConsoleError,
    models::session::BucketGrant,
    services::{browser::BrowserView, console_client::ConsoleClient},
};
use anyhow::{Result, anyhow, bail};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

/// Shared state for one CLI invocation.
pub struct Console {
    pub cfg: AppConfig,
    pub client: Arc<ConsoleClient>,
}

impl Console {
    pub fn new(cfg: AppConfig) -> Result<Self> {
        let client = ConsoleClient::new(&cfg).map_err(report)?;
        Ok(Self {
            cfg,
            client: Arc::new(client),
        })
    }

    /// Bucket and root prefix to browse.
    ///
    /// Explicit configuration wins; anything missing is filled from the
    /// caller's grants.
    pub async fn location(&self) -> Result<(String, String)> {
        if let (Some(bucket), Some(prefix)) = (&self.cfg.bucket, &self.cfg.prefix) {
            return Ok((bucket.clone(), prefix.clone()));
        }
        let grants = self.client.my_grants().await.map_err(report)?;
        let (bucket, prefix) = pick_location(
            self.cfg.bucket.as_deref(),
            self.cfg.prefix.as_deref(),
            &grants,
        )?;
        debug!("browsing {}/{}", bucket, prefix);
        Ok((bucket, prefix))
    }

    pub async fn browser(&self) -> Result<BrowserView> {
        let (bucket, prefix) = self.location().await?;
        Ok(BrowserView::new(bucket, prefix, self.client.clone()))
    }
}

/// First listable grant on `bucket` (or on any bucket when none is
/// configured) supplies whatever the configuration left open.
pub fn pick_location(
    bucket: Option<&str>,
    prefix: Option<&str>,
    grants: &[BucketGrant],
) -> Result<(String, String)> {
    let grant = grants
        .iter()
        .filter(|g| g.can_list)
        .find(|g| bucket.is_none_or(|b| g.bucket_name == b));

    match (bucket, grant) {
        (Some(b), Some(g)) => Ok((b.to_string(), prefix.unwrap_or(&g.prefix).to_string())),
        (Some(b), None) => Ok((b.to_string(), prefix.unwrap_or("").to_string())),
        (None, Some(g)) => Ok((
            g.bucket_name.clone(),
            prefix.unwrap_or(&g.prefix).to_string(),
        )),
        (None, None) => bail!("No bucket configured and no listable grant found; pass --bucket"),
    }
}

/// Log the diagnostic detail and surface only the user-facing message.
pub fn report(err: ConsoleError) -> anyhow::Error {
    debug!("{}", err);
    anyhow!(err.user_message())
}

/// Print each prompt on stderr and read one line from stdin for it.
///
/// All lines come through one reader so piped input is not lost between
/// prompts.
pub async fn prompt_lines(prompts: &[&str]) -> Result<Vec<String>> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stderr = tokio::io::stderr();
    let mut answers = Vec::with_capacity(prompts.len());
    for message in prompts {
        if !message.is_empty() {
            stderr.write_all(message.as_bytes()).await?;
            stderr.flush().await?;
        }
        let mut line = String::new();
        if stdin.read_line(&mut line).await? == 0 {
            bail!("unexpected end of input");
        }
        answers.push(line.trim_end_matches(['\r', '\n']).to_string());
    }
    Ok(answers)
}

pub async fn prompt(message: &str) -> Result<String> {
    let mut answers = prompt_lines(&[message]).await?;
    Ok(answers.pop().unwrap_or_default())
}
