use anyhow::Result;
use s3_console::{config, routes};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup (stderr, so stdout stays clean for output) ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // --- Parse config + command ---
    let (cfg, command) = config::AppConfig::from_env_and_args()?;

    tracing::debug!(
        "console {}{} bucket={:?} prefix={:?}",
        cfg.server_url,
        cfg.api_prefix,
        cfg.bucket,
        cfg.prefix
    );

    routes::commands::dispatch(cfg, command).await
}
