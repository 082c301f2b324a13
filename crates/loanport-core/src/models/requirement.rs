use serde::{Deserialize, Serialize};

use super::document_type::DocumentType;
use super::financing::FinancingCategory;
use super::upload::{UploadItem, UploadStatus};

/// A document category the workflow demands before it can move on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDocument {
    /// Display name, e.g. "Bank Statements".
    pub label: String,
    /// Explicit quantity. When absent the count is inferred from the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_count: Option<u32>,
    /// Explicit grouping tag. When absent the normalized label is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

impl RequiredDocument {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            required_count: None,
            document_type: None,
        }
    }

    pub fn with_count(label: impl Into<String>, required_count: u32) -> Self {
        Self {
            required_count: Some(required_count),
            ..Self::new(label)
        }
    }

    /// Requirement keyed on a backend tag, labelled for display.
    pub fn for_type(doc_type: DocumentType) -> Self {
        Self {
            label: doc_type.label().to_string(),
            required_count: None,
            document_type: Some(doc_type.as_str().to_string()),
        }
    }

    pub fn for_category(category: FinancingCategory) -> Vec<Self> {
        category
            .required_documents()
            .iter()
            .copied()
            .map(Self::for_type)
            .collect()
    }
}

/// Upload that reached `completed`, reduced to what requirement matching needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedUpload {
    pub file_name: String,
    pub document_type: String,
}

impl CompletedUpload {
    pub fn new(file_name: impl Into<String>, document_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            document_type: document_type.into(),
        }
    }

    /// `None` unless the item completed.
    pub fn from_item(item: &UploadItem) -> Option<Self> {
        (item.status == UploadStatus::Completed)
            .then(|| Self::new(item.file.name.clone(), item.document_type.clone()))
    }
}

/// Completion of one required category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub label: String,
    pub document_type: String,
    pub required: u32,
    pub uploaded: u32,
    pub complete: bool,
}

/// Completion across every required category; `all_complete` gates progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementReport {
    pub all_complete: bool,
    pub results: Vec<ValidationResult>,
    /// File names seen under more than one category; counted only once.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
}

impl RequirementReport {
    /// Report for an empty requirement list.
    pub fn passthrough() -> Self {
        Self {
            all_complete: true,
            results: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn result_for(&self, document_type: &str) -> Option<&ValidationResult> {
        self.results
            .iter()
            .find(|r| r.document_type == document_type)
    }

    pub fn missing(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.complete)
    }
}
