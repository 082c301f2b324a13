//! Document endpoints of the public application API.

use anyhow::Result;
use chrono::{DateTime, Utc};
use loanport_core::{FileData, UploadError, UploadMilestone, UploadReceipt};
use serde::{Deserialize, Serialize};

use crate::{transport_error, ApiClient};

/// Body of `POST /api/public/applications/{id}/documents`.
///
/// Some deployments return the id at the top level, others nest the stored
/// record under `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub data: Option<UploadedDocument>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub id: String,
}

impl UploadResponse {
    /// A 2xx status alone is not success: the body must say `success: true`
    /// and name the stored document.
    pub fn into_receipt(self) -> Result<UploadReceipt, UploadError> {
        if self.success != Some(true) {
            let reason = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "Server did not confirm the upload".to_string());
            return Err(UploadError::Rejected(reason));
        }

        self.document_id
            .or_else(|| self.data.map(|d| d.id))
            .map(|document_id| UploadReceipt { document_id })
            .ok_or_else(|| UploadError::Rejected("Upload response has no documentId".to_string()))
    }
}

/// One stored document as listed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub file_name: String,
    pub document_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
}

fn documents_path(application_id: &str) -> String {
    format!("/api/public/applications/{}/documents", application_id)
}

impl ApiClient {
    /// Upload one document. `on_progress` is called at each milestone the
    /// transport lets us observe.
    pub async fn upload_document(
        &self,
        application_id: &str,
        document_type: &str,
        file: &FileData,
        on_progress: &(dyn Fn(UploadMilestone) + Send + Sync),
    ) -> Result<UploadReceipt, UploadError> {
        on_progress(UploadMilestone::Started);

        let part = reqwest::multipart::Part::bytes(file.data.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| UploadError::UnsupportedType {
                file_name: file.name.clone(),
                content_type: format!("{} ({})", file.content_type, e),
            })?;
        let form = reqwest::multipart::Form::new()
            .part("document", part)
            .text("documentType", document_type.to_string());

        tracing::debug!(
            application_id = %application_id,
            file_name = %file.name,
            document_type = %document_type,
            size = file.size,
            "Sending document upload"
        );
        on_progress(UploadMilestone::RequestSent);

        let response = self
            .post_multipart(&documents_path(application_id), form)
            .await?;
        on_progress(UploadMilestone::ResponseReceived);

        let body: UploadResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                UploadError::Rejected(format!("Malformed upload response: {}", e))
            } else {
                transport_error(e)
            }
        })?;

        let receipt = body.into_receipt()?;
        on_progress(UploadMilestone::Confirmed);
        Ok(receipt)
    }

    /// Documents the server holds for an application.
    pub async fn list_documents(&self, application_id: &str) -> Result<Vec<DocumentRecord>> {
        let body: DocumentListResponse = self.get(&documents_path(application_id), &[]).await?;
        if !body.success {
            return Err(anyhow::anyhow!(
                "Document listing for application {} was not successful",
                application_id
            ));
        }
        Ok(body.documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_requires_success_true() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"success":false,"error":"Virus detected"}"#).unwrap();
        assert_eq!(
            body.into_receipt(),
            Err(UploadError::Rejected("Virus detected".to_string()))
        );

        let body: UploadResponse = serde_json::from_str(r#"{"documentId":"d1"}"#).unwrap();
        assert!(body.into_receipt().is_err());
    }

    #[test]
    fn test_receipt_reads_nested_id() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"success":true,"data":{"id":"DOC-1"}}"#).unwrap();
        assert_eq!(body.into_receipt().unwrap().document_id, "DOC-1");

        let body: UploadResponse =
            serde_json::from_str(r#"{"success":true,"documentId":"d2"}"#).unwrap();
        assert_eq!(body.into_receipt().unwrap().document_id, "d2");
    }

    #[test]
    fn test_document_record_camel_case() {
        let record: DocumentRecord = serde_json::from_str(
            r#"{"id":"d1","fileName":"jan.pdf","documentType":"bank_statements","size":1200}"#,
        )
        .unwrap();
        assert_eq!(record.file_name, "jan.pdf");
        assert_eq!(record.size, Some(1200));
        assert!(record.created_at.is_none());
    }
}
