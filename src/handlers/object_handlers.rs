//! Single-object commands: `download`, `url` and `rm`.
//!
//! Object paths are typed relative to the root prefix and resolved through
//! the same validated navigation as folder browsing.

use super::{
    Console,
    output::{ListingOutput, print_output, print_success},
    prompt, report,
};
use crate::{interfaces::ProgressFn, services::hierarchy};
use anyhow::{Result, bail};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::{path::PathBuf, sync::Arc};

/// Full object key for `path`, plus the folder part relative to the root.
fn object_key(
    view: &crate::services::browser::BrowserView,
    path: &str,
) -> Result<(String, String)> {
    let (folder, name) = hierarchy::resolve_object(view.state(), path).map_err(report)?;
    Ok((
        format!("{}{}", folder.full_prefix(), name),
        folder.current_path().to_string(),
    ))
}

/// `s3-console url <path>`
pub async fn presigned_url(console: &Console, path: &str) -> Result<()> {
    let mut view = console.browser().await?;
    let (key, _) = object_key(&view, path)?;
    let credential = view
        .download_credential(console.client.as_ref(), &key)
        .await
        .map_err(report)?;

    if console.cfg.json {
        println!(
            "{}",
            serde_json::json!({
                "key": key,
                "url": credential.url,
                "expires_in": credential.expires_in,
            })
        );
    } else {
        println!("{}", credential.url);
    }
    Ok(())
}

/// `s3-console download <path> [--output file]`
pub async fn download(console: &Console, path: &str, output: Option<PathBuf>) -> Result<()> {
    let mut view = console.browser().await?;
    let (key, _) = object_key(&view, path)?;
    let dest = match output {
        Some(p) => p,
        None => PathBuf::from(key.rsplit('/').next().unwrap_or("download")),
    };

    let credential = view
        .download_credential(console.client.as_ref(), &key)
        .await
        .map_err(report)?;

    let bar = ProgressBar::new(0);
    if console.cfg.json {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {bytes}/{total_bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(key.clone());
    let on_progress: ProgressFn = {
        let bar = bar.clone();
        Arc::new(move |sent, total| {
            bar.set_length(total);
            bar.set_position(sent);
        })
    };

    match console
        .client
        .download_to_file(&credential, &dest, on_progress)
        .await
    {
        Ok(bytes) => {
            bar.finish_and_clear();
            print_success(
                &format!("Downloaded {} ({} bytes) to {}", key, bytes, dest.display()),
                console.cfg.json,
            );
            Ok(())
        }
        Err(err) => {
            bar.abandon();
            Err(report(err))
        }
    }
}

/// `s3-console rm <path> [--yes]`
pub async fn remove(console: &Console, path: &str, yes: bool) -> Result<()> {
    let mut view = console.browser().await?;
    let (key, folder) = object_key(&view, path)?;

    if !yes {
        let answer = prompt(&format!("Are you sure you want to delete {}? [y/N] ", key)).await?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            bail!("Aborted");
        }
    }

    view.open_path(&folder).await.map_err(report)?;
    view.delete(console.client.as_ref(), &key)
        .await
        .map_err(report)?;

    print_success(&format!("Deleted {}", key), console.cfg.json);
    if !console.cfg.json {
        print_output(
            &ListingOutput {
                bucket: view.bucket(),
                prefix: view.state().full_prefix(),
                entries: view.entries(),
            },
            false,
        );
    }
    Ok(())
}
