use loanport_core::{ErrorKind, UploadStatus};
use serde::Serialize;
use uuid::Uuid;

/// Change to the visible upload list, published to every subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    Added {
        id: Uuid,
        file_name: String,
        document_type: String,
    },
    Progress {
        id: Uuid,
        progress: u8,
    },
    Completed {
        id: Uuid,
        document_id: String,
    },
    Failed {
        id: Uuid,
        kind: ErrorKind,
        error: String,
    },
    Retrying {
        id: Uuid,
        attempt: u32,
    },
    Removed {
        id: Uuid,
        status: UploadStatus,
    },
}

impl UploadEvent {
    pub fn id(&self) -> Uuid {
        match self {
            UploadEvent::Added { id, .. }
            | UploadEvent::Progress { id, .. }
            | UploadEvent::Completed { id, .. }
            | UploadEvent::Failed { id, .. }
            | UploadEvent::Retrying { id, .. }
            | UploadEvent::Removed { id, .. } => *id,
        }
    }
}
