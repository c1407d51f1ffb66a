//! `health`: liveness of the console server.

use super::{Console, output::Outputable, output::print_output, report};
use crate::services::console_client::HealthStatus;
use anyhow::Result;

impl Outputable for HealthStatus {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Status:      {}", self.status);
        if let Some(version) = &self.version {
            out.push_str(&format!("\nVersion:     {}", version));
        }
        if let Some(env) = &self.environment {
            out.push_str(&format!("\nEnvironment: {}", env));
        }
        out
    }
}

/// `s3-console health`
///
/// Unauthenticated; succeeds whenever the server answers 2xx.
pub async fn health(console: &Console) -> Result<()> {
    let status = console.client.health().await.map_err(report)?;
    print_output(&status, console.cfg.json);
    Ok(())
}
