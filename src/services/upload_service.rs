//! src/services/upload_service.rs
//!
//! UploadOrchestrator: drives a batch of independent, fallible uploads
//! against single-use pre-signed POST credentials.
//!
//! Files run strictly one at a time in selection order. Each task moves
//! `Pending -> InProgress -> Succeeded | Failed`; one file's failure never
//! stops the next. After every transfer a best-effort completion notice goes
//! to the audit sink; its failure is logged and otherwise ignored.

use crate::{
    errors::{ConsoleError, ConsoleResult},
    interfaces::{CompletionNotifier, CredentialIssuer, ObjectTransport, ProgressFn},
    models::{
        audit::CompletionNotice,
        upload::{
            BatchOutcome, FileOutcome, FileReport, LocalFile, UploadBatchResult, UploadStatus,
            UploadTask,
        },
    },
};
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

const CREDENTIAL_FAILED: &str = "credential issuance failed";

/// Receives task transitions and progress as they happen.
pub trait UploadObserver: Send + Sync {
    fn task_started(&self, _task: &UploadTask) {}
    fn progress(&self, _task_id: Uuid, _percent: u8) {}
    fn task_finished(&self, _task: &UploadTask) {}
}

/// Observer that only logs.
pub struct TracingObserver;

impl UploadObserver for TracingObserver {
    fn task_started(&self, task: &UploadTask) {
        debug!("uploading {} -> {}", task.file.path.display(), task.destination_key);
    }

    fn task_finished(&self, task: &UploadTask) {
        debug!("{} {}", task.destination_key, task.status);
    }
}

/// Integer percentage that never goes backwards.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    percent: AtomicU8,
}

impl ProgressTracker {
    /// Record `sent` of `total` bytes and return the percentage to display.
    pub fn record(&self, sent: u64, total: u64) -> u8 {
        let candidate = percent_of(sent, total);
        let previous = self.percent.fetch_max(candidate, Ordering::Relaxed);
        previous.max(candidate)
    }

    pub fn current(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }
}

/// `sent * 100 / total`, rounded to nearest, clamped to 100.
/// An empty file is complete by definition.
fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let scaled = (sent as u128 * 100 + total as u128 / 2) / total as u128;
    scaled.min(100) as u8
}

pub struct UploadOrchestrator {
    bucket: String,
    destination_prefix: String,
    issuer: Arc<dyn CredentialIssuer>,
    transport: Arc<dyn ObjectTransport>,
    notifier: Arc<dyn CompletionNotifier>,
    tasks: Vec<UploadTask>,
}

impl UploadOrchestrator {
    pub fn new(
        bucket: impl Into<String>,
        destination_prefix: impl Into<String>,
        issuer: Arc<dyn CredentialIssuer>,
        transport: Arc<dyn ObjectTransport>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            destination_prefix: destination_prefix.into(),
            issuer,
            transport,
            notifier,
            tasks: Vec::new(),
        }
    }

    pub fn destination_prefix(&self) -> &str {
        &self.destination_prefix
    }

    /// The pending-file set, in selection order.
    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    /// Add files to the pending set; returns the new task ids.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = LocalFile>) -> Vec<Uuid> {
        let prefix = self.destination_prefix.clone();
        files
            .into_iter()
            .map(|file| {
                let task = UploadTask::new(file, &prefix);
                let id = task.id;
                self.tasks.push(task);
                id
            })
            .collect()
    }

    /// Drop a task that is not in flight.
    ///
    /// While `run` is executing it holds `&mut self`, so an `InProgress`
    /// task can never be reached from here.
    pub fn remove(&mut self, id: Uuid) -> ConsoleResult<UploadTask> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ConsoleError::TaskNotFound(id))?;
        let task = &self.tasks[idx];
        match task.status {
            UploadStatus::Pending | UploadStatus::Failed => Ok(self.tasks.remove(idx)),
            status => Err(ConsoleError::TaskNotRemovable {
                name: task.name().to_string(),
                status: status.to_string(),
            }),
        }
    }

    /// Upload every task in the pending set, in order.
    ///
    /// Tasks left `Failed` by an earlier run are retried. The aggregate result
    /// is built once all tasks are terminal. On full success the pending set
    /// is cleared; otherwise only the failed tasks are kept for inspection
    /// and retry.
    pub async fn run(
        &mut self,
        observer: Arc<dyn UploadObserver>,
    ) -> ConsoleResult<UploadBatchResult> {
        if self.tasks.is_empty() {
            return Err(ConsoleError::NoPendingFiles);
        }

        for task in self.tasks.iter_mut() {
            if task.status == UploadStatus::Failed {
                task.status = UploadStatus::Pending;
                task.progress_percent = 0;
                task.error_detail = None;
            }
        }

        info!(
            "uploading {} file(s) to {}/{}",
            self.tasks.len(),
            self.bucket,
            self.destination_prefix
        );

        for idx in 0..self.tasks.len() {
            self.process(idx, &observer).await;
        }

        debug_assert!(self.tasks.iter().all(|t| t.status.is_terminal()));
        let reports = self
            .tasks
            .iter()
            .map(|t| FileReport {
                name: t.name().to_string(),
                key: t.destination_key.clone(),
                outcome: if t.status == UploadStatus::Succeeded {
                    FileOutcome::Succeeded
                } else {
                    FileOutcome::Failed
                },
                error: t.error_detail.clone(),
            })
            .collect();
        let result = UploadBatchResult::from_reports(reports);

        match result.outcome() {
            BatchOutcome::Success => self.tasks.clear(),
            _ => self.tasks.retain(|t| t.status == UploadStatus::Failed),
        }

        info!("{}", result.summary());
        Ok(result)
    }

    async fn process(&mut self, idx: usize, observer: &Arc<dyn UploadObserver>) {
        let bucket = self.bucket.clone();
        let task = &mut self.tasks[idx];
        task.status = UploadStatus::InProgress;
        observer.task_started(task);

        let notice = match self
            .issuer
            .issue_upload_credential(&bucket, &task.destination_key)
            .await
        {
            Ok(credential) => {
                let tracker = Arc::new(ProgressTracker::default());
                let on_progress: ProgressFn = {
                    let tracker = tracker.clone();
                    let observer = observer.clone();
                    let task_id = task.id;
                    Arc::new(move |sent, total| {
                        let percent = tracker.record(sent, total);
                        observer.progress(task_id, percent);
                    })
                };

                let outcome = self
                    .transport
                    .post_object(&credential, &task.file, on_progress)
                    .await;
                task.progress_percent = tracker.current();

                match outcome {
                    Ok(receipt) => {
                        task.status = UploadStatus::Succeeded;
                        task.progress_percent = 100;
                        if let (Some(remote), Some(local)) = (&receipt.etag, &receipt.local_md5) {
                            if !remote.eq_ignore_ascii_case(local) {
                                warn!(
                                    "etag mismatch for {}: store reported {}, local md5 {}",
                                    task.destination_key, remote, local
                                );
                            }
                        }
                        task.etag = receipt.etag;
                        CompletionNotice::success(&bucket, &task.destination_key)
                    }
                    Err(err) => {
                        let detail = err.detail();
                        warn!("upload of {} failed: {}", task.destination_key, detail);
                        task.status = UploadStatus::Failed;
                        task.error_detail = Some(detail.clone());
                        CompletionNotice::failure(&bucket, &task.destination_key, detail)
                    }
                }
            }
            Err(err) => {
                // transfer is never attempted without a credential
                warn!("credential for {} failed: {}", task.destination_key, err);
                task.status = UploadStatus::Failed;
                task.error_detail = Some(CREDENTIAL_FAILED.into());
                CompletionNotice::failure(&bucket, &task.destination_key, CREDENTIAL_FAILED)
            }
        };

        if let Err(err) = self.notifier.notify(&notice).await {
            warn!(
                "completion notice for {} not recorded: {}",
                task.destination_key, err
            );
        }

        observer.task_finished(task);
    }
}
