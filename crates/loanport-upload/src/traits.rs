//! Seams of the orchestrator: how a file reaches the server and how the user
//! hears about it.

use async_trait::async_trait;
use loanport_api_client::ApiClient;
use loanport_core::{FileData, UploadError, UploadMilestone, UploadReceipt};

use crate::notify::Notification;

/// Milestone callback handed to an uploader for one file.
pub type ProgressFn = dyn Fn(UploadMilestone) + Send + Sync;

/// Sends one document to the application's document store.
#[async_trait]
pub trait DocumentUploader: Send + Sync {
    async fn upload(
        &self,
        application_id: &str,
        document_type: &str,
        file: &FileData,
        on_progress: &ProgressFn,
    ) -> Result<UploadReceipt, UploadError>;
}

#[async_trait]
impl DocumentUploader for ApiClient {
    async fn upload(
        &self,
        application_id: &str,
        document_type: &str,
        file: &FileData,
        on_progress: &ProgressFn,
    ) -> Result<UploadReceipt, UploadError> {
        self.upload_document(application_id, document_type, file, on_progress)
            .await
    }
}

/// One-shot user notifications (the toast of a browser client).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
