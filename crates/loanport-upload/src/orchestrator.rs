//! Upload orchestrator: validate, queue, upload one at a time, gate.
//!
//! The item list lives behind a plain mutex that is never held across an
//! await. Uploads are serialized by a separate async lock, so files submitted
//! from concurrent calls still reach the server strictly one after another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use loanport_core::validation::{
    screen_document, validate_requirements, FileValidator, ScreeningReport,
};
use loanport_core::{
    CompletedUpload, ErrorMetadata, FileData, LogLevel, RequiredDocument, RequirementReport,
    UploadConfig, UploadError, UploadItem, UploadMilestone, UploadReceipt, UploadStatus,
};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::events::UploadEvent;
use crate::notify::{Notification, TracingNotifier};
use crate::traits::{DocumentUploader, Notifier};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Outcome of a `submit` or `retry_failed` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Items created (or restarted) by the call, in upload order.
    pub accepted: Vec<Uuid>,
    /// Files refused before any network call.
    pub rejected: Vec<UploadError>,
    pub completed: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty()
    }
}

/// Work needed to (re)send one item. Kept apart from the visible item so that
/// removing the row does not stop the upload.
#[derive(Clone)]
struct Job {
    file: FileData,
    document_type: String,
    token: CancellationToken,
    /// Item attempt this job belongs to. Results and progress from any other
    /// attempt are stale.
    attempt: u32,
}

#[derive(Default)]
struct State {
    items: Vec<UploadItem>,
    jobs: HashMap<Uuid, Job>,
    /// Every upload that reached `completed`, including rows already removed.
    ledger: Vec<CompletedUpload>,
}

struct Inner {
    application_id: String,
    config: UploadConfig,
    validator: FileValidator,
    uploader: Arc<dyn DocumentUploader>,
    notifier: Arc<dyn Notifier>,
    required: Vec<RequiredDocument>,
    state: Mutex<State>,
    upload_turn: tokio::sync::Mutex<()>,
    events: broadcast::Sender<UploadEvent>,
    gate: watch::Sender<RequirementReport>,
}

pub struct UploadOrchestratorBuilder {
    application_id: String,
    uploader: Arc<dyn DocumentUploader>,
    config: UploadConfig,
    notifier: Arc<dyn Notifier>,
    required: Vec<RequiredDocument>,
}

impl UploadOrchestratorBuilder {
    pub fn config(mut self, config: UploadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Required document categories whose completion drives [`UploadOrchestrator::gate`].
    pub fn requirements(mut self, required: Vec<RequiredDocument>) -> Self {
        self.required = required;
        self
    }

    pub fn build(self) -> UploadOrchestrator {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (gate, _) = watch::channel(validate_requirements(&self.required, &[]));

        UploadOrchestrator {
            inner: Arc::new(Inner {
                application_id: self.application_id,
                validator: FileValidator::from_config(&self.config),
                config: self.config,
                uploader: self.uploader,
                notifier: self.notifier,
                required: self.required,
                state: Mutex::new(State::default()),
                upload_turn: tokio::sync::Mutex::new(()),
                events,
                gate,
            }),
        }
    }
}

/// Owns the upload list of one application.
#[derive(Clone)]
pub struct UploadOrchestrator {
    inner: Arc<Inner>,
}

impl UploadOrchestrator {
    pub fn builder(
        application_id: impl Into<String>,
        uploader: Arc<dyn DocumentUploader>,
    ) -> UploadOrchestratorBuilder {
        UploadOrchestratorBuilder {
            application_id: application_id.into(),
            uploader,
            config: UploadConfig::default(),
            notifier: Arc::new(TracingNotifier),
            required: Vec::new(),
        }
    }

    pub fn application_id(&self) -> &str {
        &self.inner.application_id
    }

    /// Snapshot of the visible list, in insertion order.
    pub fn items(&self) -> Vec<UploadItem> {
        self.inner.state().items.clone()
    }

    pub fn item(&self, id: Uuid) -> Option<UploadItem> {
        self.inner.state().items.iter().find(|i| i.id == id).cloned()
    }

    pub fn completed_uploads(&self) -> Vec<CompletedUpload> {
        self.inner.state().ledger.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.inner.events.subscribe()
    }

    /// Latest requirement report; updated after every terminal state change.
    pub fn gate(&self) -> watch::Receiver<RequirementReport> {
        self.inner.gate.subscribe()
    }

    pub fn requirement_report(&self) -> RequirementReport {
        let state = self.inner.state();
        validate_requirements(&self.inner.required, &state.ledger)
    }

    /// Validate `files`, queue the accepted ones under `document_type` and
    /// upload them in order. Returns once every accepted file is terminal.
    pub async fn submit(&self, files: Vec<FileData>, document_type: &str) -> BatchReport {
        let mut report = BatchReport::default();
        let mut accepted = Vec::with_capacity(files.len());

        for file in files {
            match self.inner.validator.validate_all(&file) {
                Ok(()) => accepted.push(file),
                Err(err) => {
                    tracing::debug!(
                        file_name = %file.name,
                        document_type = %document_type,
                        error_code = err.error_code(),
                        "File rejected before upload"
                    );
                    self.inner.notifier.notify(Notification::from_error(&err));
                    report.rejected.push(err);
                }
            }
        }

        report.accepted = self.inner.enqueue(accepted, document_type, &mut report.rejected);

        let _turn = self.inner.upload_turn.lock().await;
        for id in report.accepted.clone() {
            match self.inner.run_upload(id).await {
                UploadStatus::Completed => report.completed.push(id),
                _ => report.failed.push(id),
            }
        }

        report
    }

    /// Re-run the upload of an `error` item. Exactly one new upload call is made.
    pub async fn retry(&self, id: Uuid) -> Result<UploadStatus, UploadError> {
        self.inner.prepare_retry(id)?;
        let _turn = self.inner.upload_turn.lock().await;
        Ok(self.inner.run_upload(id).await)
    }

    /// Retry every `error` item, one after another, in list order.
    pub async fn retry_failed(&self) -> BatchReport {
        let failed: Vec<Uuid> = {
            let state = self.inner.state();
            state
                .items
                .iter()
                .filter(|i| i.status == UploadStatus::Error)
                .map(|i| i.id)
                .collect()
        };

        tracing::info!(
            application_id = %self.inner.application_id,
            count = failed.len(),
            "Retrying failed uploads"
        );

        let mut report = BatchReport::default();
        for id in failed {
            match self.retry(id).await {
                Ok(UploadStatus::Completed) => {
                    report.accepted.push(id);
                    report.completed.push(id);
                }
                Ok(_) => {
                    report.accepted.push(id);
                    report.failed.push(id);
                }
                // Removed or already restarted by another caller meanwhile.
                Err(err) => {
                    tracing::debug!(upload_id = %id, error = %err, "Skipping retry");
                }
            }
        }
        report
    }

    /// Drop an item from the visible list. An in-flight upload keeps running;
    /// use [`UploadOrchestrator::cancel`] to stop it.
    pub fn remove(&self, id: Uuid) -> Result<UploadItem, UploadError> {
        let mut state = self.inner.state();
        let index = state
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(UploadError::NotFound(id))?;
        let item = state.items.remove(index);

        tracing::debug!(
            upload_id = %id,
            file_name = %item.file.name,
            status = %item.status,
            in_flight = state.jobs.contains_key(&id),
            "Upload removed from list"
        );
        self.inner.emit(UploadEvent::Removed {
            id,
            status: item.status,
        });
        Ok(item)
    }

    /// Abort a queued or in-flight upload. The item ends in `error` and can be retried.
    pub fn cancel(&self, id: Uuid) -> Result<(), UploadError> {
        let err = UploadError::Cancelled;
        {
            let mut state = self.inner.state();
            let Some(job) = state.jobs.get(&id) else {
                return Err(match state.items.iter().find(|i| i.id == id) {
                    Some(item) => UploadError::InvalidState {
                        id,
                        status: item.status,
                        expected: UploadStatus::Uploading,
                    },
                    None => UploadError::NotFound(id),
                });
            };
            job.token.cancel();

            if let Some(item) = state.items.iter_mut().find(|i| i.id == id) {
                if item.fail(err.to_string()) {
                    tracing::info!(
                        upload_id = %id,
                        file_name = %item.file.name,
                        document_type = %item.document_type,
                        "Upload cancelled"
                    );
                    self.inner.emit(UploadEvent::Failed {
                        id,
                        kind: err.kind(),
                        error: err.to_string(),
                    });
                }
            }
        }

        self.inner.notifier.notify(Notification::from_error(&err));
        Ok(())
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(state: &State, id: Uuid, attempt: u32) -> bool {
        state.jobs.get(&id).is_some_and(|job| job.attempt == attempt)
    }

    fn emit(&self, event: UploadEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Insert accepted files as `uploading` items, truncating to the remaining
    /// capacity. Dropped files are appended to `rejected`.
    fn enqueue(
        &self,
        mut files: Vec<FileData>,
        document_type: &str,
        rejected: &mut Vec<UploadError>,
    ) -> Vec<Uuid> {
        let max = self.config.max_files;
        let mut dropped = Vec::new();
        let mut screenings: Vec<ScreeningReport> = files
            .iter()
            .map(|file| screen_document(&file.name, document_type, &file.data))
            .collect();

        let ids = {
            let mut state = self.state();
            let remaining = max.saturating_sub(state.items.len());
            if files.len() > remaining {
                dropped = files.split_off(remaining);
                screenings.truncate(remaining);
            }

            files
                .into_iter()
                .zip(screenings)
                .map(|(file, screening)| {
                    log_screening(&screening);

                    let item = UploadItem::new(file.clone(), document_type);
                    let id = item.id;
                    state.jobs.insert(
                        id,
                        Job {
                            file,
                            document_type: document_type.to_string(),
                            token: CancellationToken::new(),
                            attempt: item.attempts,
                        },
                    );
                    self.emit(UploadEvent::Added {
                        id,
                        file_name: item.file.name.clone(),
                        document_type: item.document_type.clone(),
                    });
                    state.items.push(item);
                    id
                })
                .collect()
        };

        for file in dropped {
            let err = UploadError::QueueFull {
                file_name: file.name,
                max,
            };
            tracing::warn!(error = %err, "File dropped, upload list is full");
            self.notifier.notify(Notification::from_error(&err));
            rejected.push(err);
        }

        ids
    }

    fn prepare_retry(&self, id: Uuid) -> Result<(), UploadError> {
        let mut state = self.state();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(UploadError::NotFound(id))?;
        item.restart()?;

        let attempt = item.attempts;
        let job = Job {
            file: item.file.clone(),
            document_type: item.document_type.clone(),
            token: CancellationToken::new(),
            attempt,
        };
        tracing::info!(
            upload_id = %id,
            file_name = %item.file.name,
            document_type = %item.document_type,
            attempt,
            "Retrying upload"
        );
        state.jobs.insert(id, job);
        self.emit(UploadEvent::Retrying { id, attempt });
        Ok(())
    }

    fn record_progress(&self, id: Uuid, attempt: u32, milestone: UploadMilestone) {
        let mut state = self.state();
        if !Self::is_current(&state, id, attempt) {
            return;
        }
        if let Some(item) = state.items.iter_mut().find(|i| i.id == id) {
            let before = item.progress;
            item.advance(milestone);
            if item.progress != before {
                self.emit(UploadEvent::Progress {
                    id,
                    progress: item.progress,
                });
            }
        }
    }

    /// Send one queued item. Caller holds the upload turn.
    async fn run_upload(self: &Arc<Self>, id: Uuid) -> UploadStatus {
        let job = {
            let state = self.state();
            match state.jobs.get(&id) {
                Some(job) => job.clone(),
                // Already finished by an earlier turn.
                None => {
                    return state
                        .items
                        .iter()
                        .find(|i| i.id == id)
                        .map(|i| i.status)
                        .unwrap_or(UploadStatus::Error);
                }
            }
        };

        let result = if job.token.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            let inner = Arc::clone(self);
            let attempt = job.attempt;
            let on_progress =
                move |milestone: UploadMilestone| inner.record_progress(id, attempt, milestone);

            tokio::select! {
                biased;
                _ = job.token.cancelled() => Err(UploadError::Cancelled),
                result = self.uploader.upload(
                    &self.application_id,
                    &job.document_type,
                    &job.file,
                    &on_progress,
                ) => result,
            }
        };

        let status = self.finish(id, &job, result);
        if status == UploadStatus::Completed {
            self.schedule_auto_remove(id);
        }
        status
    }

    /// Apply a terminal result, notify, and republish the gate.
    fn finish(
        &self,
        id: Uuid,
        job: &Job,
        result: Result<UploadReceipt, UploadError>,
    ) -> UploadStatus {
        let file_name = job.file.name.as_str();
        let document_type = job.document_type.as_str();

        let (status, notification, ledger) = {
            let mut state = self.state();
            if !Self::is_current(&state, id, job.attempt) {
                // Cancelled attempt unwinding after a retry replaced its job.
                tracing::debug!(
                    upload_id = %id,
                    file_name = %file_name,
                    attempt = job.attempt,
                    "Discarding result of superseded attempt"
                );
                return UploadStatus::Error;
            }
            state.jobs.remove(&id);
            let item = state.items.iter_mut().find(|i| i.id == id);

            let (status, notification) = match result {
                Ok(receipt) => {
                    let document_id = receipt.document_id.clone();
                    let applied = match item {
                        Some(item) => item.complete(receipt),
                        // Row was removed while the upload ran; the server still has it.
                        None => true,
                    };
                    if applied {
                        tracing::info!(
                            upload_id = %id,
                            file_name = %file_name,
                            document_type = %document_type,
                            document_id = %document_id,
                            "Document uploaded"
                        );
                        state
                            .ledger
                            .push(CompletedUpload::new(file_name, document_type));
                        self.emit(UploadEvent::Completed { id, document_id });
                        (UploadStatus::Completed, Some(Notification::success(file_name)))
                    } else {
                        (UploadStatus::Error, None)
                    }
                }
                Err(err) => {
                    let applied = match item {
                        Some(item) => item.fail(err.to_string()),
                        None => !matches!(err, UploadError::Cancelled),
                    };
                    if applied {
                        log_failure(id, file_name, document_type, &err);
                        self.emit(UploadEvent::Failed {
                            id,
                            kind: err.kind(),
                            error: err.to_string(),
                        });
                        (UploadStatus::Error, Some(Notification::from_error(&err)))
                    } else {
                        (UploadStatus::Error, None)
                    }
                }
            };

            (status, notification, state.ledger.clone())
        };

        if let Some(notification) = notification {
            self.notifier.notify(notification);
        }
        self.gate
            .send_replace(validate_requirements(&self.required, &ledger));
        status
    }

    fn schedule_auto_remove(self: &Arc<Self>, id: Uuid) {
        let inner = Arc::clone(self);
        let delay = self.config.auto_remove_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = inner.state();
            if let Some(index) = state
                .items
                .iter()
                .position(|i| i.id == id && i.status == UploadStatus::Completed)
            {
                state.items.remove(index);
                tracing::debug!(upload_id = %id, "Completed upload removed from list");
                inner.emit(UploadEvent::Removed {
                    id,
                    status: UploadStatus::Completed,
                });
            }
        });
    }
}

fn log_screening(screening: &ScreeningReport) {
    if screening.is_authentic() {
        tracing::debug!(
            file_name = %screening.file_name,
            document_type = %screening.document_type,
            size = screening.size,
            checksum_sha256 = %screening.checksum_sha256,
            "Document queued"
        );
    } else {
        tracing::warn!(
            file_name = %screening.file_name,
            document_type = %screening.document_type,
            status = ?screening.status,
            checksum_sha256 = %screening.checksum_sha256,
            findings = ?screening.errors,
            "Document screening flagged file, uploading anyway"
        );
    }
}

fn log_failure(id: Uuid, file_name: &str, document_type: &str, err: &UploadError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            upload_id = %id,
            file_name = %file_name,
            document_type = %document_type,
            error_code = err.error_code(),
            error = %err,
            "Upload failed"
        ),
        LogLevel::Warn => tracing::warn!(
            upload_id = %id,
            file_name = %file_name,
            document_type = %document_type,
            error_code = err.error_code(),
            error = %err,
            "Upload failed"
        ),
        LogLevel::Error => tracing::error!(
            upload_id = %id,
            file_name = %file_name,
            document_type = %document_type,
            error_code = err.error_code(),
            error = %err,
            "Upload failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use loanport_core::{ErrorKind, RequiredDocument};

    use super::*;
    use crate::notify::CollectingNotifier;
    use crate::test_helpers::ScriptedUploader;

    fn pdf(name: &str) -> FileData {
        FileData::new(name, "application/pdf", Bytes::from(vec![7u8; 2048]))
    }

    fn setup(uploader: Arc<ScriptedUploader>) -> (UploadOrchestrator, Arc<CollectingNotifier>) {
        let notifier = Arc::new(CollectingNotifier::new());
        let orchestrator = UploadOrchestrator::builder("app-1", uploader)
            .notifier(notifier.clone())
            .build();
        (orchestrator, notifier)
    }

    async fn wait_for<F>(events: &mut broadcast::Receiver<UploadEvent>, mut pred: F) -> UploadEvent
    where
        F: FnMut(&UploadEvent) -> bool,
    {
        loop {
            let event = events.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_uploads_are_sequential_in_submission_order() {
        let uploader = Arc::new(ScriptedUploader::new().with_delay(Duration::from_millis(50)));
        let (orchestrator, _) = setup(uploader.clone());

        let report = orchestrator
            .submit(vec![pdf("f1.pdf"), pdf("f2.pdf"), pdf("f3.pdf")], "tax_returns")
            .await;

        assert_eq!(report.completed.len(), 3);
        assert_eq!(uploader.call_names(), vec!["f1.pdf", "f2.pdf", "f3.pdf"]);
        assert_eq!(uploader.max_in_flight(), 1);
        assert!(uploader
            .calls()
            .iter()
            .all(|c| c.application_id == "app-1" && c.document_type == "tax_returns"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submits_do_not_overlap() {
        let uploader = Arc::new(ScriptedUploader::new().with_delay(Duration::from_millis(50)));
        let (orchestrator, _) = setup(uploader.clone());

        let (a, b) = tokio::join!(
            orchestrator.submit(vec![pdf("a1.pdf"), pdf("a2.pdf")], "bank_statements"),
            orchestrator.submit(vec![pdf("b1.pdf")], "tax_returns"),
        );

        assert_eq!(a.completed.len() + b.completed.len(), 3);
        assert_eq!(uploader.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_oversized_file_never_reaches_network() {
        let uploader = Arc::new(ScriptedUploader::new());
        let (orchestrator, notifier) = setup(uploader.clone());
        let big = FileData::new(
            "big.pdf",
            "application/pdf",
            Bytes::from(vec![0u8; 5_242_881]),
        );

        let report = orchestrator
            .submit(vec![big, pdf("ok.pdf")], "tax_returns")
            .await;

        assert_eq!(uploader.call_names(), vec!["ok.pdf"]);
        assert!(matches!(
            report.rejected.as_slice(),
            [UploadError::FileTooLarge { .. }]
        ));
        assert!(orchestrator.items().iter().all(|i| i.file.name != "big.pdf"));
        assert_eq!(notifier.titles()[0], "File too large");
    }

    #[tokio::test]
    async fn test_unsupported_type_is_not_queued() {
        let uploader = Arc::new(ScriptedUploader::new());
        let (orchestrator, _) = setup(uploader.clone());
        let gif = FileData::new("logo.gif", "image/gif", Bytes::from_static(b"GIF89a"));

        let report = orchestrator.submit(vec![gif], "other").await;

        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].kind(), ErrorKind::ValidationRejection);
        assert!(uploader.calls().is_empty());
        assert!(orchestrator.items().is_empty());
    }

    #[tokio::test]
    async fn test_batch_truncated_to_remaining_capacity() {
        let uploader = Arc::new(ScriptedUploader::new());
        let notifier = Arc::new(CollectingNotifier::new());
        let orchestrator = UploadOrchestrator::builder("app-1", uploader.clone())
            .config(UploadConfig {
                max_files: 2,
                ..UploadConfig::default()
            })
            .notifier(notifier.clone())
            .build();

        let report = orchestrator
            .submit(vec![pdf("1.pdf"), pdf("2.pdf"), pdf("3.pdf")], "tax_returns")
            .await;

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(
            report.rejected,
            vec![UploadError::QueueFull {
                file_name: "3.pdf".to_string(),
                max: 2
            }]
        );
        assert_eq!(uploader.call_names(), vec!["1.pdf", "2.pdf"]);
        assert!(notifier.titles().contains(&"Too many files".to_string()));
    }

    #[tokio::test]
    async fn test_server_rejection_marks_item_error() {
        let uploader = Arc::new(ScriptedUploader::new());
        uploader.fail_next("a.pdf", UploadError::Rejected("Server did not confirm the upload".into()));
        let (orchestrator, notifier) = setup(uploader.clone());

        let report = orchestrator.submit(vec![pdf("a.pdf")], "tax_returns").await;

        let item = orchestrator.item(report.failed[0]).unwrap();
        assert_eq!(item.status, UploadStatus::Error);
        assert!(item.document_id.is_none());
        assert!(item.error.as_deref().unwrap().contains("did not confirm"));
        assert_eq!(notifier.titles(), vec!["Upload failed"]);
        assert!(orchestrator.completed_uploads().is_empty());
    }

    #[tokio::test]
    async fn test_connectivity_failure_gets_distinct_notification() {
        let uploader = Arc::new(ScriptedUploader::new());
        uploader.fail_next("a.pdf", UploadError::Transport("fetch failed".into()));
        let (orchestrator, notifier) = setup(uploader);

        orchestrator.submit(vec![pdf("a.pdf")], "tax_returns").await;

        assert_eq!(notifier.titles(), vec!["Connection problem"]);
    }

    #[tokio::test]
    async fn test_retry_reissues_exactly_one_call() {
        let uploader = Arc::new(ScriptedUploader::new());
        uploader.fail_next("a.pdf", UploadError::Transport("Network error".into()));
        let (orchestrator, _) = setup(uploader.clone());

        let report = orchestrator.submit(vec![pdf("a.pdf")], "tax_returns").await;
        let id = report.failed[0];
        assert_eq!(uploader.calls().len(), 1);

        let status = orchestrator.retry(id).await.unwrap();

        assert_eq!(status, UploadStatus::Completed);
        assert_eq!(uploader.calls().len(), 2);
        let item = orchestrator.item(id).unwrap();
        assert_eq!(item.status, UploadStatus::Completed);
        assert_eq!(item.progress, 100);
        assert_eq!(item.attempts, 2);
        assert!(item.document_id.is_some());
    }

    #[tokio::test]
    async fn test_retry_requires_error_status() {
        let uploader = Arc::new(ScriptedUploader::new());
        let (orchestrator, _) = setup(uploader.clone());
        let report = orchestrator.submit(vec![pdf("a.pdf")], "tax_returns").await;

        assert!(matches!(
            orchestrator.retry(report.completed[0]).await,
            Err(UploadError::InvalidState {
                status: UploadStatus::Completed,
                ..
            })
        ));
        assert!(matches!(
            orchestrator.retry(Uuid::new_v4()).await,
            Err(UploadError::NotFound(_))
        ));
        assert_eq!(uploader.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_failed_runs_in_list_order() {
        let uploader = Arc::new(ScriptedUploader::new());
        uploader.fail_next("a.pdf", UploadError::Transport("fetch failed".into()));
        uploader.fail_next("c.pdf", UploadError::Transport("fetch failed".into()));
        let (orchestrator, _) = setup(uploader.clone());

        orchestrator
            .submit(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")], "bank_statements")
            .await;
        let report = orchestrator.retry_failed().await;

        assert_eq!(report.completed.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(
            uploader.call_names(),
            vec!["a.pdf", "b.pdf", "c.pdf", "a.pdf", "c.pdf"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_items_are_removed_after_delay() {
        let uploader = Arc::new(ScriptedUploader::new());
        let (orchestrator, _) = setup(uploader);

        let report = orchestrator.submit(vec![pdf("a.pdf")], "tax_returns").await;
        let id = report.completed[0];
        assert!(orchestrator.item(id).is_some());

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert!(orchestrator.item(id).is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(orchestrator.item(id).is_none());
        assert_eq!(orchestrator.completed_uploads().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_does_not_cancel_in_flight_upload() {
        let uploader = Arc::new(ScriptedUploader::new().with_delay(Duration::from_millis(100)));
        let (orchestrator, _) = setup(uploader.clone());
        let mut events = orchestrator.subscribe();

        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit(vec![pdf("a.pdf")], "tax_returns").await })
        };
        let id = wait_for(&mut events, |e| matches!(e, UploadEvent::Progress { .. }))
            .await
            .id();

        let removed = orchestrator.remove(id).unwrap();
        assert_eq!(removed.status, UploadStatus::Uploading);

        let report = task.await.unwrap();
        assert_eq!(report.completed, vec![id]);
        assert!(orchestrator.item(id).is_none());
        assert_eq!(orchestrator.completed_uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_aborts_upload_and_allows_retry() {
        let uploader = Arc::new(ScriptedUploader::new());
        uploader.hang_next("a.pdf");
        let (orchestrator, notifier) = setup(uploader.clone());
        let mut events = orchestrator.subscribe();

        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit(vec![pdf("a.pdf")], "tax_returns").await })
        };
        let id = wait_for(&mut events, |e| matches!(e, UploadEvent::Progress { .. }))
            .await
            .id();

        orchestrator.cancel(id).unwrap();
        let report = task.await.unwrap();

        assert_eq!(report.failed, vec![id]);
        let item = orchestrator.item(id).unwrap();
        assert_eq!(item.status, UploadStatus::Error);
        assert_eq!(item.error.as_deref(), Some("Upload cancelled"));
        assert_eq!(notifier.titles(), vec!["Upload cancelled"]);
        assert!(matches!(
            orchestrator.cancel(id),
            Err(UploadError::InvalidState { .. })
        ));

        assert_eq!(orchestrator.retry(id).await.unwrap(), UploadStatus::Completed);
        assert_eq!(uploader.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_right_after_cancel_uploads_once_more() {
        let uploader = Arc::new(ScriptedUploader::new());
        uploader.hang_next("a.pdf");
        let (orchestrator, notifier) = setup(uploader.clone());
        let mut events = orchestrator.subscribe();

        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit(vec![pdf("a.pdf")], "tax_returns").await })
        };
        let id = wait_for(&mut events, |e| matches!(e, UploadEvent::Progress { .. }))
            .await
            .id();

        // The hung attempt has not unwound yet when the retry is queued.
        orchestrator.cancel(id).unwrap();
        let status = orchestrator.retry(id).await.unwrap();
        task.await.unwrap();

        assert_eq!(status, UploadStatus::Completed);
        assert_eq!(uploader.calls().len(), 2);
        let item = orchestrator.item(id).unwrap();
        assert_eq!(item.status, UploadStatus::Completed);
        assert_eq!(item.attempts, 2);
        assert_eq!(
            notifier.titles(),
            vec!["Upload cancelled", "Upload Successful"]
        );
        assert_eq!(orchestrator.completed_uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_gate_follows_completed_uploads() {
        let uploader = Arc::new(ScriptedUploader::new());
        let orchestrator = UploadOrchestrator::builder("app-1", uploader)
            .requirements(vec![
                RequiredDocument::new("Tax Returns"),
                RequiredDocument::with_count("Bank Statements", 2),
            ])
            .build();
        let gate = orchestrator.gate();
        assert!(!gate.borrow().all_complete);

        orchestrator.submit(vec![pdf("2023.pdf")], "tax_returns").await;
        assert!(!gate.borrow().all_complete);
        assert!(gate.borrow().result_for("tax_returns").unwrap().complete);

        orchestrator
            .submit(vec![pdf("jan.pdf"), pdf("feb.pdf")], "bank_statements")
            .await;
        assert!(gate.borrow().all_complete);
        assert_eq!(orchestrator.requirement_report(), *gate.borrow());
    }

    #[tokio::test]
    async fn test_no_requirements_never_gates() {
        let uploader = Arc::new(ScriptedUploader::new());
        let (orchestrator, _) = setup(uploader);
        assert!(orchestrator.gate().borrow().all_complete);
    }
}
