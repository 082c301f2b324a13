use std::fmt::{Display, Formatter, Result as FmtResult};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UploadError;

/// Status of a file in the visible upload list. Pending is implicit: a file
/// that has not been inserted yet has no item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Completed,
    Error,
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Completed => write!(f, "completed"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Error)
    }
}

/// Coarse progress checkpoints. The transport does not expose byte-level
/// progress, so an upload reports these instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMilestone {
    Started,
    RequestSent,
    ResponseReceived,
    Confirmed,
}

impl UploadMilestone {
    pub fn percent(&self) -> u8 {
        match self {
            UploadMilestone::Started => 10,
            UploadMilestone::RequestSent => 30,
            UploadMilestone::ResponseReceived => 70,
            UploadMilestone::Confirmed => 100,
        }
    }
}

/// A user-selected file: raw payload plus the metadata the browser would expose.
#[derive(Debug, Clone, Serialize)]
pub struct FileData {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    #[serde(skip)]
    pub data: Bytes,
}

impl FileData {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: data.len() as u64,
            data,
        }
    }

    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// Server acknowledgement of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub document_id: String,
}

/// One user-selected file in flight.
///
/// Status moves `uploading -> completed | error`; `error -> uploading` only
/// through [`UploadItem::restart`]. Progress never decreases while uploading.
#[derive(Debug, Clone, Serialize)]
pub struct UploadItem {
    pub id: Uuid,
    pub file: FileData,
    /// Wire tag sent as `documentType`.
    pub document_type: String,
    pub progress: u8,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl UploadItem {
    pub fn new(file: FileData, document_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            document_type: document_type.into(),
            progress: 0,
            status: UploadStatus::Uploading,
            document_id: None,
            error: None,
            attempts: 1,
            created_at: Utc::now(),
        }
    }

    /// Raise progress to the milestone. Ignored outside `uploading` and for
    /// milestones below the current progress.
    pub fn advance(&mut self, milestone: UploadMilestone) {
        if self.status == UploadStatus::Uploading {
            self.progress = self.progress.max(milestone.percent());
        }
    }

    /// Returns false if the item was not uploading (e.g. cancelled meanwhile).
    pub fn complete(&mut self, receipt: UploadReceipt) -> bool {
        if self.status != UploadStatus::Uploading {
            return false;
        }
        self.status = UploadStatus::Completed;
        self.progress = 100;
        self.document_id = Some(receipt.document_id);
        self.error = None;
        true
    }

    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status != UploadStatus::Uploading {
            return false;
        }
        self.status = UploadStatus::Error;
        self.error = Some(message.into());
        true
    }

    /// Reset an errored item for another attempt.
    pub fn restart(&mut self) -> Result<(), UploadError> {
        if self.status != UploadStatus::Error {
            return Err(UploadError::InvalidState {
                id: self.id,
                status: self.status,
                expected: UploadStatus::Error,
            });
        }
        self.status = UploadStatus::Uploading;
        self.progress = 0;
        self.error = None;
        self.attempts += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> FileData {
        FileData::new(name, "application/pdf", Bytes::from_static(b"%PDF-1.4"))
    }

    #[test]
    fn test_new_item_is_uploading() {
        let item = UploadItem::new(pdf("a.pdf"), "bank_statements");
        assert_eq!(item.status, UploadStatus::Uploading);
        assert_eq!(item.progress, 0);
        assert_eq!(item.file.size, 8);
        assert_eq!(item.attempts, 1);
        assert!(item.document_id.is_none());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut item = UploadItem::new(pdf("a.pdf"), "tax_returns");
        item.advance(UploadMilestone::ResponseReceived);
        item.advance(UploadMilestone::Started);
        assert_eq!(item.progress, 70);
    }

    #[test]
    fn test_complete_sets_document_id() {
        let mut item = UploadItem::new(pdf("a.pdf"), "tax_returns");
        assert!(item.complete(UploadReceipt {
            document_id: "doc-1".to_string()
        }));
        assert_eq!(item.status, UploadStatus::Completed);
        assert_eq!(item.progress, 100);
        assert_eq!(item.document_id.as_deref(), Some("doc-1"));
        assert!(!item.fail("late failure"));
        assert_eq!(item.status, UploadStatus::Completed);
    }

    #[test]
    fn test_restart_only_from_error() {
        let mut item = UploadItem::new(pdf("a.pdf"), "tax_returns");
        assert!(matches!(
            item.restart(),
            Err(UploadError::InvalidState {
                status: UploadStatus::Uploading,
                ..
            })
        ));

        item.advance(UploadMilestone::RequestSent);
        item.fail("Network error");
        item.restart().unwrap();
        assert_eq!(item.status, UploadStatus::Uploading);
        assert_eq!(item.progress, 0);
        assert!(item.error.is_none());
        assert_eq!(item.attempts, 2);
    }

    #[test]
    fn test_extension_lowercased() {
        let file = FileData::new("Scan.JPEG", "image/jpeg", Bytes::new());
        assert_eq!(file.extension().as_deref(), Some("jpeg"));
        assert_eq!(FileData::new("README", "text/plain", Bytes::new()).extension(), None);
    }
}
