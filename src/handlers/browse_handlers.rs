//! `ls`: one folder level of the configured bucket.

use super::{
    Console,
    output::{ListingOutput, print_output},
    report,
};
use anyhow::Result;

/// `s3-console ls [path]`
pub async fn list(console: &Console, path: &str) -> Result<()> {
    let mut view = console.browser().await?;
    view.open_path(path).await.map_err(report)?;

    print_output(
        &ListingOutput {
            bucket: view.bucket(),
            prefix: view.state().full_prefix(),
            entries: view.entries(),
        },
        console.cfg.json,
    );
    Ok(())
}
