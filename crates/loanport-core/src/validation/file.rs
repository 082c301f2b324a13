use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::models::FileData;

/// Client-side gate applied before a file is queued.
///
/// Nothing that fails here ever reaches the network.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_size: u64,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl FileValidator {
    pub fn new(
        max_file_size: u64,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_extensions.clone(),
            config.allowed_content_types.clone(),
        )
    }

    pub fn validate_file_size(&self, file: &FileData) -> Result<(), UploadError> {
        if file.size == 0 {
            return Err(UploadError::EmptyFile {
                file_name: file.name.clone(),
            });
        }

        if file.size > self.max_file_size {
            return Err(UploadError::FileTooLarge {
                file_name: file.name.clone(),
                size: file.size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    pub fn validate_extension(&self, file: &FileData) -> Result<(), UploadError> {
        let extension = file.extension().unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Err(UploadError::InvalidExtension {
                file_name: file.name.clone(),
                extension,
            });
        }

        Ok(())
    }

    pub fn validate_content_type(&self, file: &FileData) -> Result<(), UploadError> {
        let normalized = file.content_type.to_lowercase();

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(UploadError::UnsupportedType {
                file_name: file.name.clone(),
                content_type: file.content_type.clone(),
            });
        }

        Ok(())
    }

    /// Reject a content type that disagrees with the file extension.
    pub fn validate_extension_content_type_match(
        &self,
        file: &FileData,
    ) -> Result<(), UploadError> {
        let extension = file.extension().unwrap_or_default();
        let normalized_content_type = file.content_type.to_lowercase();

        let expected_content_types: &[&str] = match extension.as_str() {
            "jpg" | "jpeg" => &["image/jpeg", "image/jpg"],
            "png" => &["image/png"],
            "pdf" => &["application/pdf"],
            "doc" => &["application/msword"],
            "docx" => &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
            _ => {
                tracing::debug!(
                    extension = %extension,
                    content_type = %file.content_type,
                    "Unknown extension, skipping content type cross-check"
                );
                return Ok(());
            }
        };

        if !expected_content_types
            .iter()
            .any(|ct| *ct == normalized_content_type)
        {
            return Err(UploadError::ContentTypeMismatch {
                file_name: file.name.clone(),
                content_type: file.content_type.clone(),
                extension,
            });
        }

        Ok(())
    }

    /// Size first, so an oversized file always reports as oversized.
    pub fn validate_all(&self, file: &FileData) -> Result<(), UploadError> {
        self.validate_file_size(file)?;
        self.validate_extension(file)?;
        self.validate_content_type(file)?;
        self.validate_extension_content_type_match(file)?;
        Ok(())
    }
}
