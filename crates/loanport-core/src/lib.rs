//! Loanport Core Library
//!
//! This crate provides the domain models, error types, configuration and validation
//! shared by the loanport upload client, orchestrator and CLI.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{PortalConfig, UploadConfig, DEFAULT_MAX_FILE_SIZE_BYTES};
pub use error::{ErrorKind, ErrorMetadata, LogLevel, UploadError};
pub use models::{
    CompletedUpload, DocumentType, FileData, FinancingCategory, RequiredDocument,
    RequirementReport, UploadItem, UploadMilestone, UploadReceipt, UploadStatus,
    ValidationResult,
};
pub use validation::{validate_items, validate_requirements, FileValidator};
