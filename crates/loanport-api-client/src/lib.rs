//! HTTP client for the loan portal public application API.
//!
//! Provides a small client with optional Bearer auth, a generic GET helper and
//! the document endpoints (upload, list). The upload path reports failures as
//! [`UploadError`] so the orchestrator can tell transport problems from server
//! rejections.

pub mod api;

use std::time::Duration;

use anyhow::{Context, Result};
use loanport_core::{PortalConfig, UploadError};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the public application API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `timeout` of `None` keeps the transport default.
    pub fn new(base_url: String, token: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &PortalConfig) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            config.api_token.clone(),
            config.request_timeout,
        )
    }

    /// Create client from environment: LOANPORT_API_URL (or API_URL), LOANPORT_API_TOKEN
    /// (or CLIENT_APP_SHARED_TOKEN).
    pub fn from_env() -> Result<Self> {
        let config = PortalConfig::from_env().context("Invalid portal configuration")?;
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);
        request = self.apply_auth(request);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// POST multipart form. Returns the response only when the status is 2xx.
    async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<reqwest::Response, UploadError> {
        let url = self.build_url(path);
        let request = self.client.post(&url).multipart(form);
        let request = self.apply_auth(request);

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UploadError::Server {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }
}

/// Map a reqwest failure onto the upload taxonomy. Anything that never got a
/// status line back is a transport failure.
pub(crate) fn transport_error(err: reqwest::Error) -> UploadError {
    match err.status() {
        Some(status) => UploadError::Server {
            status: status.as_u16(),
            message: err.to_string(),
        },
        None => UploadError::Transport(err.to_string()),
    }
}

pub use api::{DocumentListResponse, DocumentRecord, UploadResponse};
