//! In-memory uploader for exercising the orchestrator without a server.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use loanport_core::{FileData, UploadError, UploadMilestone, UploadReceipt};

use crate::traits::{DocumentUploader, ProgressFn};

/// One recorded call to [`ScriptedUploader::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub application_id: String,
    pub document_type: String,
    pub file_name: String,
}

enum Step {
    Fail(UploadError),
    /// Never answers; only cancellation ends the call.
    Hang,
}

/// Uploader that succeeds unless a step was scripted for the file name.
/// Steps are consumed in order, one per call.
#[derive(Default)]
pub struct ScriptedUploader {
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<UploadCall>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_next(&self, file_name: &str, err: UploadError) {
        self.push_step(file_name, Step::Fail(err));
    }

    pub fn hang_next(&self, file_name: &str) {
        self.push_step(file_name, Step::Hang);
    }

    fn push_step(&self, file_name: &str, step: Step) {
        self.steps
            .lock()
            .unwrap()
            .entry(file_name.to_string())
            .or_default()
            .push_back(step);
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.file_name).collect()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentUploader for ScriptedUploader {
    async fn upload(
        &self,
        application_id: &str,
        document_type: &str,
        file: &FileData,
        on_progress: &ProgressFn,
    ) -> Result<UploadReceipt, UploadError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(UploadCall {
                application_id: application_id.to_string(),
                document_type: document_type.to_string(),
                file_name: file.name.clone(),
            });
            calls.len()
        };
        let step = self
            .steps
            .lock()
            .unwrap()
            .get_mut(&file.name)
            .and_then(|queue| queue.pop_front());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        on_progress(UploadMilestone::Started);
        on_progress(UploadMilestone::RequestSent);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match step {
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) => std::future::pending::<Result<UploadReceipt, UploadError>>().await,
            None => {
                on_progress(UploadMilestone::ResponseReceived);
                on_progress(UploadMilestone::Confirmed);
                Ok(UploadReceipt {
                    document_id: format!("doc-{}", call_number),
                })
            }
        }
    }
}
