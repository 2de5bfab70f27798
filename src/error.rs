// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CmsError>;

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Blog post with slug \"{slug}\" not found")]
    NotFound { slug: String },

    #[error("Frontmatter parsing error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("CRM request failed with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl CmsError {
    pub fn missing_field(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: format!("Missing required field: {}", field),
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(slug: &str) -> Self {
        Self::NotFound {
            slug: slug.to_string(),
        }
    }

    pub fn file_op(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOperation {
            path: path.into(),
            source,
        }
    }

    /// Re-labels a parse error with the file it came from.
    pub fn in_file(self, file: &str) -> Self {
        match self {
            Self::Parse { message, .. } => Self::Parse {
                file: file.to_string(),
                message,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
