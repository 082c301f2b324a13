//! Error types module
//!
//! Every failure an upload can hit is a variant of [`UploadError`]. Variants fall into
//! the kinds reported by [`ErrorKind`]: client-side rejections caught before any network
//! call, transport failures (unreachable host, DNS, timeout) and server failures (non-2xx
//! status or a 2xx body without `success: true`). All of them end at the individual
//! upload item and are recoverable through a user-initiated retry.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::models::UploadStatus;

/// Messages that indicate the request never reached the server.
static CONNECTIVITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(failed to fetch|fetch failed|network ?error|error sending request|connection (refused|reset|closed|aborted)|dns error|timed? ?out|unreachable)",
    )
    .expect("connectivity pattern is valid")
});

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an unreachable server
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Coarse classification used to pick the notification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Oversized, empty or unsupported file, caught before upload.
    ValidationRejection,
    /// Network unreachable, DNS, timeout.
    TransportFailure,
    /// Non-2xx HTTP status or a body without `success: true`.
    ServerFailure,
    /// In-flight request aborted through its cancellation token.
    Cancelled,
    /// Caller asked for something the item list cannot do (unknown id, wrong state).
    Usage,
}

/// Metadata describing how an error should be presented
pub trait ErrorMetadata {
    /// Taxonomy bucket of this error
    fn kind(&self) -> ErrorKind;

    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether the upload can be retried as-is
    fn is_recoverable(&self) -> bool;

    /// Short notification title
    fn title(&self) -> &'static str;

    /// User-facing message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("{file_name} is empty")]
    EmptyFile { file_name: String },

    #[error("{file_name} exceeds the size limit: {size} bytes (max: {max} bytes)")]
    FileTooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },

    #[error("{file_name} has an unsupported extension: {extension}")]
    InvalidExtension {
        file_name: String,
        extension: String,
    },

    #[error("{file_name} has an unsupported content type: {content_type}")]
    UnsupportedType {
        file_name: String,
        content_type: String,
    },

    #[error("{file_name} content type {content_type} does not match extension {extension}")]
    ContentTypeMismatch {
        file_name: String,
        content_type: String,
        extension: String,
    },

    #[error("{file_name} was dropped: at most {max} files can be queued")]
    QueueFull { file_name: String, max: usize },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Upload failed with status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Upload {0} not found")]
    NotFound(Uuid),

    #[error("Upload {id} is {status}, expected {expected}")]
    InvalidState {
        id: Uuid,
        status: UploadStatus,
        expected: UploadStatus,
    },
}

/// True when a failure message looks like the request never reached the server.
pub fn is_connectivity_message(message: &str) -> bool {
    CONNECTIVITY_PATTERN.is_match(message)
}

/// Static metadata for each variant: (kind, error_code, recoverable, title, log_level).
fn upload_error_static_metadata(
    err: &UploadError,
) -> (ErrorKind, &'static str, bool, &'static str, LogLevel) {
    match err {
        UploadError::EmptyFile { .. } => (
            ErrorKind::ValidationRejection,
            "EMPTY_FILE",
            false,
            "Empty file",
            LogLevel::Debug,
        ),
        UploadError::FileTooLarge { .. } => (
            ErrorKind::ValidationRejection,
            "FILE_TOO_LARGE",
            false,
            "File too large",
            LogLevel::Debug,
        ),
        UploadError::InvalidExtension { .. } => (
            ErrorKind::ValidationRejection,
            "INVALID_EXTENSION",
            false,
            "Unsupported file type",
            LogLevel::Debug,
        ),
        UploadError::UnsupportedType { .. } => (
            ErrorKind::ValidationRejection,
            "UNSUPPORTED_TYPE",
            false,
            "Unsupported file type",
            LogLevel::Debug,
        ),
        UploadError::ContentTypeMismatch { .. } => (
            ErrorKind::ValidationRejection,
            "CONTENT_TYPE_MISMATCH",
            false,
            "Unsupported file type",
            LogLevel::Debug,
        ),
        UploadError::QueueFull { .. } => (
            ErrorKind::ValidationRejection,
            "QUEUE_FULL",
            false,
            "Too many files",
            LogLevel::Debug,
        ),
        UploadError::Transport(_) => (
            ErrorKind::TransportFailure,
            "TRANSPORT_ERROR",
            true,
            "Connection problem",
            LogLevel::Warn,
        ),
        UploadError::Server { .. } => (
            ErrorKind::ServerFailure,
            "SERVER_ERROR",
            true,
            "Upload failed",
            LogLevel::Error,
        ),
        UploadError::Rejected(_) => (
            ErrorKind::ServerFailure,
            "UPLOAD_REJECTED",
            true,
            "Upload failed",
            LogLevel::Error,
        ),
        UploadError::Cancelled => (
            ErrorKind::Cancelled,
            "CANCELLED",
            true,
            "Upload cancelled",
            LogLevel::Debug,
        ),
        UploadError::NotFound(_) => (
            ErrorKind::Usage,
            "NOT_FOUND",
            false,
            "Upload not found",
            LogLevel::Debug,
        ),
        UploadError::InvalidState { .. } => (
            ErrorKind::Usage,
            "INVALID_STATE",
            false,
            "Action not available",
            LogLevel::Debug,
        ),
    }
}

impl UploadError {
    /// Whether the failure should be surfaced as a connectivity problem rather
    /// than a generic upload failure.
    pub fn is_connectivity(&self) -> bool {
        match self {
            UploadError::Transport(_) => true,
            UploadError::Server { message, .. } | UploadError::Rejected(message) => {
                is_connectivity_message(message)
            }
            _ => false,
        }
    }
}

impl ErrorMetadata for UploadError {
    fn kind(&self) -> ErrorKind {
        upload_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).2
    }

    fn title(&self) -> &'static str {
        if self.is_connectivity() {
            return "Connection problem";
        }
        upload_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::FileTooLarge { file_name, max, .. } => format!(
                "{} exceeds the {} MB size limit.",
                file_name,
                max / (1024 * 1024)
            ),
            UploadError::QueueFull { file_name, max } => format!(
                "{} was not added. You can upload up to {} files at a time.",
                file_name, max
            ),
            err if err.is_connectivity() => {
                "Could not reach the server. Check your connection and retry.".to_string()
            }
            UploadError::Server { status, .. } => {
                format!("The server rejected the upload (status {}).", status)
            }
            UploadError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
