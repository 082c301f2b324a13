//! Configuration module
//!
//! This module provides the configuration for the API client and the upload
//! orchestrator. Values come from the environment (with `.env` support) and fall
//! back to the portal defaults. A numeric setting that is present but does not
//! parse is an error.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Per-file upload limit (5 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;

const DEFAULT_MAX_FILES: usize = 10;
const DEFAULT_AUTO_REMOVE_DELAY_MS: u64 = 3000;
const DEFAULT_API_URL: &str = "http://localhost:5000";

pub const CONTENT_TYPE_PDF: &str = "application/pdf";
pub const CONTENT_TYPE_DOC: &str = "application/msword";
pub const CONTENT_TYPE_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";
pub const CONTENT_TYPE_PNG: &str = "image/png";

/// Constraints applied to every file before it is queued, plus queue behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadConfig {
    pub max_file_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    /// Maximum number of items held in the visible list at once.
    pub max_files: usize,
    /// How long a completed item stays visible before it is dropped from the list.
    pub auto_remove_delay: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_extensions: ["pdf", "doc", "docx", "jpg", "jpeg", "png"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_content_types: [
                CONTENT_TYPE_PDF,
                CONTENT_TYPE_DOC,
                CONTENT_TYPE_DOCX,
                CONTENT_TYPE_JPEG,
                CONTENT_TYPE_PNG,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_files: DEFAULT_MAX_FILES,
            auto_remove_delay: Duration::from_millis(DEFAULT_AUTO_REMOVE_DELAY_MS),
        }
    }
}

impl UploadConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "LOANPORT_MAX_FILE_SIZE_BYTES must be greater than zero"
            ));
        }
        if self.max_files == 0 {
            return Err(anyhow::anyhow!("LOANPORT_MAX_FILES must be greater than zero"));
        }
        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "LOANPORT_ALLOWED_CONTENT_TYPES must list at least one content type"
            ));
        }
        Ok(())
    }
}

/// Full portal client configuration.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    /// Explicit HTTP timeout. `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
    pub upload: UploadConfig,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = UploadConfig::default();

        let api_url = env::var("LOANPORT_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let api_token = env::var("LOANPORT_API_TOKEN")
            .or_else(|_| env::var("CLIENT_APP_SHARED_TOKEN"))
            .ok()
            .filter(|s| !s.is_empty());

        let request_timeout = parse_setting::<u64>(
            "LOANPORT_REQUEST_TIMEOUT_SECS",
            env::var("LOANPORT_REQUEST_TIMEOUT_SECS").ok(),
        )?
        .map(Duration::from_secs);

        let allowed_content_types = env::var("LOANPORT_ALLOWED_CONTENT_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|ct| ct.trim().to_lowercase())
                    .filter(|ct| !ct.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.allowed_content_types);

        let upload = UploadConfig {
            max_file_size_bytes: parse_setting(
                "LOANPORT_MAX_FILE_SIZE_BYTES",
                env::var("LOANPORT_MAX_FILE_SIZE_BYTES").ok(),
            )?
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES),
            allowed_extensions: defaults.allowed_extensions,
            allowed_content_types,
            max_files: parse_setting("LOANPORT_MAX_FILES", env::var("LOANPORT_MAX_FILES").ok())?
                .unwrap_or(DEFAULT_MAX_FILES),
            auto_remove_delay: Duration::from_millis(
                parse_setting(
                    "LOANPORT_AUTO_REMOVE_DELAY_MS",
                    env::var("LOANPORT_AUTO_REMOVE_DELAY_MS").ok(),
                )?
                .unwrap_or(DEFAULT_AUTO_REMOVE_DELAY_MS),
            ),
        };

        let config = PortalConfig {
            api_url,
            api_token,
            request_timeout,
            upload,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "LOANPORT_API_URL must start with http:// or https://"
            ));
        }
        self.upload.validate()
    }
}

/// Parse an optional numeric setting. Unset or blank means `None`; anything
/// else must parse.
fn parse_setting<T: FromStr>(
    name: &str,
    raw: Option<String>,
) -> Result<Option<T>, anyhow::Error> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a whole number, got {:?}", name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_config_defaults() {
        let config = UploadConfig::default();
        assert_eq!(config.max_file_size_bytes, 5_242_880);
        assert_eq!(config.max_files, 10);
        assert_eq!(config.auto_remove_delay, Duration::from_secs(3));
        assert_eq!(config.allowed_content_types.len(), 5);
        assert!(config.allowed_extensions.contains(&"docx".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_upload_config_rejects_zero_limits() {
        let config = UploadConfig {
            max_files: 0,
            ..UploadConfig::default()
        };
        assert!(config.validate().is_err());

        let config = UploadConfig {
            max_file_size_bytes: 0,
            ..UploadConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_portal_config_rejects_bad_url() {
        let config = PortalConfig {
            api_url: "localhost:5000".to_string(),
            api_token: None,
            request_timeout: None,
            upload: UploadConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_numeric_settings_reject_garbage() {
        assert_eq!(parse_setting::<usize>("LOANPORT_MAX_FILES", None).unwrap(), None);
        assert_eq!(
            parse_setting::<usize>("LOANPORT_MAX_FILES", Some(" 4 ".to_string())).unwrap(),
            Some(4)
        );
        assert_eq!(
            parse_setting::<u64>("LOANPORT_MAX_FILE_SIZE_BYTES", Some(String::new())).unwrap(),
            None
        );

        let err = parse_setting::<u64>("LOANPORT_AUTO_REMOVE_DELAY_MS", Some("3s".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("LOANPORT_AUTO_REMOVE_DELAY_MS"));
        assert!(
            parse_setting::<u64>("LOANPORT_MAX_FILE_SIZE_BYTES", Some("5MB".to_string())).is_err()
        );
    }
}
