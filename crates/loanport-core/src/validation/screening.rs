//! Advisory screening of document contents.
//!
//! Screening never blocks an upload. It flags files that look like
//! placeholders or are too small to be the document they claim to be, and
//! computes a checksum that can be compared against server records.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::requirements::normalize_label;

/// Below this a file cannot be a real business document.
pub const MIN_DOCUMENT_SIZE: u64 = 5 * 1024;
/// Below this a file is suspicious unless already flagged as a placeholder.
pub const SUSPICIOUS_DOCUMENT_SIZE: u64 = 10 * 1024;
pub const MAX_DOCUMENT_SIZE: u64 = 100 * 1024 * 1024;

const PLACEHOLDER_INDICATORS: &[&str] = &[
    "sample",
    "example",
    "test",
    "placeholder",
    "demo",
    "template",
    "dummy",
    "fake",
    "mock",
    "specimen",
    "draft",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreeningStatus {
    Authentic,
    Suspicious,
    Placeholder,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningReport {
    pub file_name: String,
    pub document_type: String,
    pub status: ScreeningStatus,
    pub size: u64,
    pub checksum_sha256: String,
    pub errors: Vec<String>,
}

impl ScreeningReport {
    pub fn is_authentic(&self) -> bool {
        self.status == ScreeningStatus::Authentic
    }

    fn flag(&mut self, status: ScreeningStatus, error: String) {
        self.status = self.status.max(status);
        self.errors.push(error);
    }
}

/// Expected extensions and size floor per document tag.
fn category_expectations(document_type: &str) -> Option<(&'static [&'static str], u64)> {
    let expectations: (&'static [&'static str], u64) = match document_type {
        "bank_statements" => (&["pdf", "png", "jpg", "jpeg"], 50_000),
        "tax_returns" => (&["pdf"], 100_000),
        "financial_statements" | "accountant_financials" => (&["pdf", "xlsx", "xls"], 30_000),
        "business_license" => (&["pdf", "png", "jpg", "jpeg"], 20_000),
        "accounts_receivable" | "accounts_payable" => (&["pdf", "xlsx", "csv"], 10_000),
        "income_statement" | "balance_sheet" | "cash_flow_statement" => {
            (&["pdf", "xlsx", "xls"], 25_000)
        }
        _ => return None,
    };
    Some(expectations)
}

/// Screen one document. Status escalates from authentic through suspicious
/// and placeholder to invalid; the worst finding wins.
pub fn screen_document(file_name: &str, document_type: &str, data: &[u8]) -> ScreeningReport {
    let size = data.len() as u64;
    let category = normalize_label(document_type);
    let mut report = ScreeningReport {
        file_name: file_name.to_string(),
        document_type: category.clone(),
        status: ScreeningStatus::Authentic,
        size,
        checksum_sha256: hex::encode(Sha256::digest(data)),
        errors: Vec::new(),
    };

    if size < MIN_DOCUMENT_SIZE {
        report.flag(
            ScreeningStatus::Invalid,
            format!(
                "File too small: {} bytes (minimum {} bytes)",
                size, MIN_DOCUMENT_SIZE
            ),
        );
    }
    if size > MAX_DOCUMENT_SIZE {
        report.flag(
            ScreeningStatus::Invalid,
            format!(
                "File too large: {} bytes (maximum {} bytes)",
                size, MAX_DOCUMENT_SIZE
            ),
        );
    }

    let lower_name = file_name.to_lowercase();
    let is_placeholder = PLACEHOLDER_INDICATORS
        .iter()
        .any(|indicator| lower_name.contains(indicator));
    if is_placeholder {
        report.flag(
            ScreeningStatus::Placeholder,
            "Filename contains placeholder indicators".to_string(),
        );
    } else if size < SUSPICIOUS_DOCUMENT_SIZE {
        report.flag(
            ScreeningStatus::Suspicious,
            "File size unusually small for business document".to_string(),
        );
    }

    if let Some((extensions, min_size)) = category_expectations(&category) {
        let has_expected_extension = extensions
            .iter()
            .any(|ext| lower_name.ends_with(&format!(".{}", ext)));
        if !has_expected_extension {
            report.flag(
                ScreeningStatus::Suspicious,
                format!(
                    "Invalid file type for {}. Expected: {}",
                    category,
                    extensions.join(", ")
                ),
            );
        }
        if size < min_size {
            report.flag(
                ScreeningStatus::Suspicious,
                format!(
                    "File size too small for {} ({} bytes < {} bytes)",
                    category, size, min_size
                ),
            );
        }
    }

    if !report.is_authentic() {
        tracing::debug!(
            file_name = %file_name,
            document_type = %report.document_type,
            status = ?report.status,
            findings = report.errors.len(),
            "Document screening flagged file"
        );
    }

    report
}
