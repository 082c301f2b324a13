use std::path::{Component, Path};

use anyhow::{Context, Result};
use bytes::Bytes;
use loanport_core::validation::normalize_label;
use loanport_core::{
    CompletedUpload, DocumentType, ErrorMetadata, FileData, RequiredDocument, UploadError,
    UploadItem,
};
use serde_json::{json, Value};

/// Longest error text echoed back in command output. Gateways sometimes answer
/// with a full HTML page.
pub const MAX_ERROR_LEN: usize = 200;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Backend tag sent as `documentType` for a label typed on the command line.
pub fn document_type_tag(label: &str) -> &'static str {
    DocumentType::from_label(label).as_str()
}

/// Parse `LABEL` or `LABEL=COUNT`. A label that names a known document type is
/// keyed on its backend tag so it lines up with what `upload` sends.
pub fn parse_requirement(raw: &str) -> Result<RequiredDocument> {
    let (label, count) = match raw.rsplit_once('=') {
        Some((label, count)) => {
            let count: u32 = count
                .trim()
                .parse()
                .with_context(|| format!("Invalid required count in '{}'", raw))?;
            (label.trim(), Some(count))
        }
        None => (raw.trim(), None),
    };
    if label.is_empty() {
        anyhow::bail!("Empty requirement label in '{}'", raw);
    }

    let document_type = match DocumentType::from_label(label) {
        DocumentType::Other => None,
        known => Some(known.as_str().to_string()),
    };

    Ok(RequiredDocument {
        label: label.to_string(),
        required_count: count,
        document_type,
    })
}

/// Parse `TYPE=FILE` into a completed upload for offline checks.
pub fn parse_uploaded(raw: &str) -> Result<CompletedUpload> {
    let (label, file_name) = raw
        .split_once('=')
        .with_context(|| format!("Expected TYPE=FILE, got '{}'", raw))?;
    let tag = match DocumentType::from_label(label) {
        DocumentType::Other => normalize_label(label.trim()),
        known => known.as_str().to_string(),
    };
    Ok(CompletedUpload::new(file_name.trim(), tag))
}

/// Read a local file and guess its content type from the extension.
pub fn load_file(path: &Path) -> Result<FileData> {
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
    }

    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("File name is not valid UTF-8: {}", path.display()))?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    Ok(FileData::new(
        file_name,
        content_type.essence_str(),
        Bytes::from(data),
    ))
}

/// JSON shape of a rejected or failed file in command output.
pub fn error_json(err: &UploadError) -> Value {
    json!({
        "kind": err.kind(),
        "code": err.error_code(),
        "title": err.title(),
        "message": truncate_string(&err.client_message(), MAX_ERROR_LEN),
    })
}

/// An upload run succeeded when nothing was refused and no item is left
/// failed after retries.
pub fn upload_succeeded(items: &[UploadItem], rejected: &[UploadError]) -> bool {
    rejected.is_empty() && items.iter().all(|item| item.error.is_none())
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays valid JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn item(name: &str) -> UploadItem {
        UploadItem::new(
            FileData::new(name, "application/pdf", Bytes::from_static(b"%PDF")),
            "tax_returns",
        )
    }

    #[test]
    fn upload_succeeded_needs_no_failures_or_rejections() {
        let ok = item("2023.pdf");
        let mut failed = item("2022.pdf");
        assert!(failed.fail("Upload cancelled"));

        assert!(upload_succeeded(&[ok.clone()], &[]));
        assert!(!upload_succeeded(&[ok.clone(), failed], &[]));
        assert!(!upload_succeeded(
            &[ok],
            &[UploadError::QueueFull {
                file_name: "3.pdf".to_string(),
                max: 2
            }]
        ));
    }

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("relevé bancaire", 9), "relevé...");
    }

    #[test]
    fn parse_requirement_with_count() {
        let req = parse_requirement("Bank Statements=3").unwrap();
        assert_eq!(req.label, "Bank Statements");
        assert_eq!(req.required_count, Some(3));
        assert_eq!(req.document_type.as_deref(), Some("bank_statements"));
    }

    #[test]
    fn parse_requirement_free_text() {
        let req = parse_requirement("Lease Agreement").unwrap();
        assert_eq!(req.required_count, None);
        assert_eq!(req.document_type, None);
        assert!(parse_requirement("Tax Returns=many").is_err());
        assert!(parse_requirement("=2").is_err());
    }

    #[test]
    fn parse_uploaded_maps_label_to_tag() {
        let upload = parse_uploaded("Bank Statements=jan.pdf").unwrap();
        assert_eq!(upload, CompletedUpload::new("jan.pdf", "bank_statements"));
        let upload = parse_uploaded("Lease Agreement=lease.pdf").unwrap();
        assert_eq!(upload.document_type, "lease_agreement");
        assert!(parse_uploaded("jan.pdf").is_err());
    }

    #[test]
    fn load_file_guesses_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.4")
            .unwrap();

        let file = load_file(&path).unwrap();
        assert_eq!(file.name, "statement.pdf");
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(file.size, 8);

        let docx = dir.path().join("plan.docx");
        std::fs::write(&docx, b"PK").unwrap();
        assert_eq!(
            load_file(&docx).unwrap().content_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn load_file_rejects_parent_dir() {
        assert!(load_file(Path::new("../secrets.pdf")).is_err());
        assert!(load_file(Path::new("/nonexistent/statement.pdf")).is_err());
    }

    #[test]
    fn error_json_reports_code() {
        let value = error_json(&UploadError::Transport("fetch failed".to_string()));
        assert_eq!(value["code"], "TRANSPORT_ERROR");
        assert_eq!(value["kind"], "transport_failure");
        assert_eq!(value["title"], "Connection problem");
    }
}
