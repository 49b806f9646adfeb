//! File validation: mime whitelist, then size limit.
//!
//! Pure: no side effects, no network access.

use crate::config::UploadConfig;
use crate::domain::{FileDescriptor, ValidationError};

#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_bytes: u64,
    allowed_mime_types: Vec<String>,
}

impl FileValidator {
    pub fn new(max_file_bytes: u64, allowed_mime_types: Vec<String>) -> Self {
        Self {
            max_file_bytes,
            allowed_mime_types: allowed_mime_types
                .into_iter()
                .map(|mime| mime.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.max_file_bytes, config.allowed_mime_types.clone())
    }

    /// Check one file. Rules run in order and the first violation wins.
    pub fn validate(&self, file: &FileDescriptor) -> Result<(), ValidationError> {
        self.validate_mime_type(&file.mime_type)?;
        self.validate_size(file.size)
    }

    /// `None` when valid, otherwise the message to show the user.
    pub fn violation(&self, file: &FileDescriptor) -> Option<String> {
        self.validate(file).err().map(|err| err.to_string())
    }

    pub fn validate_mime_type(&self, mime_type: &str) -> Result<(), ValidationError> {
        let normalized = mime_type.trim().to_ascii_lowercase();
        if !self.allowed_mime_types.iter().any(|allowed| *allowed == normalized) {
            return Err(ValidationError::UnsupportedType(mime_type.to_string()));
        }
        Ok(())
    }

    pub fn validate_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}
