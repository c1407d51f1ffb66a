//! `upload`: sequential batch upload into one folder with live progress.

use super::{
    Console,
    output::{ListingOutput, print_output},
    report,
};
use crate::{
    models::upload::{BatchOutcome, LocalFile, UploadStatus, UploadTask},
    services::upload_service::{UploadObserver, UploadOrchestrator},
};
use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::{collections::HashMap, path::PathBuf, sync::Arc, sync::Mutex};
use uuid::Uuid;

/// One progress bar per task, created when the task starts.
pub struct ProgressBars {
    multi: MultiProgress,
    bars: Mutex<HashMap<Uuid, ProgressBar>>,
}

impl ProgressBars {
    pub fn new(visible: bool) -> Self {
        let multi = if visible {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:32} [{bar:30}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }

    fn bar(&self, id: Uuid) -> Option<ProgressBar> {
        self.bars.lock().ok()?.get(&id).cloned()
    }
}

impl UploadObserver for ProgressBars {
    fn task_started(&self, task: &UploadTask) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(Self::style());
        bar.set_message(task.name().to_string());
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(task.id, bar);
        }
    }

    fn progress(&self, task_id: Uuid, percent: u8) {
        if let Some(bar) = self.bar(task_id) {
            bar.set_position(u64::from(percent));
        }
    }

    fn task_finished(&self, task: &UploadTask) {
        let Some(bar) = self.bar(task.id) else {
            return;
        };
        if !task.status.is_terminal() {
            return;
        }
        match task.status {
            UploadStatus::Succeeded => {
                bar.set_position(100);
                bar.finish_with_message(format!("{} done", task.name()));
            }
            _ => bar.abandon_with_message(format!(
                "{} failed: {}",
                task.name(),
                task.error_detail.as_deref().unwrap_or("unknown error")
            )),
        }
    }
}

/// `s3-console upload <files...> [--to path]`
pub async fn upload(console: &Console, files: &[PathBuf], to: &str) -> Result<()> {
    let mut selected = Vec::with_capacity(files.len());
    for path in files {
        let file = LocalFile::from_path(path)
            .await
            .with_context(|| format!("cannot upload {}", path.display()))?;
        selected.push(file);
    }

    let mut view = console.browser().await?;
    view.open_path(to).await.map_err(report)?;

    let client = console.client.clone();
    let mut orchestrator = UploadOrchestrator::new(
        view.bucket(),
        view.upload_destination(),
        client.clone(),
        client.clone(),
        client,
    );
    orchestrator.add_files(selected);
    if !console.cfg.json {
        eprintln!(
            "Uploading {} file(s) to {}/{}",
            orchestrator.tasks().len(),
            view.bucket(),
            orchestrator.destination_prefix()
        );
    }

    let observer = Arc::new(ProgressBars::new(!console.cfg.json));
    let result = orchestrator.run(observer).await.map_err(report)?;
    print_output(&result, console.cfg.json);

    if result.should_refresh_listing() {
        view.refresh().await.map_err(report)?;
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
    }

    match result.outcome() {
        BatchOutcome::Success => Ok(()),
        _ => bail!("{}", result.summary()),
    }
}
