// file: src/store/uploads.rs
// description: image uploads written to the public static directory
// reference: https://docs.rs/tokio/latest/tokio/fs

use crate::config::UploadConfig;
use crate::error::{CmsError, Result};
use crate::utils::Validator;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    pub url: String,
    pub filename: String,
}

pub struct ImageUploader {
    dir: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

impl ImageUploader {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: &str, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.dir.clone(),
            &config.public_prefix,
            config.max_size_mb * 1024 * 1024,
        )
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validates and stores one image under a randomized name, returning the
    /// public url it will be served from.
    pub async fn save(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<UploadedImage> {
        Validator::validate_image_type(content_type)?;
        Validator::validate_size(bytes.len(), self.max_bytes)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CmsError::file_op(&self.dir, e))?;

        let filename = format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8],
            extension_for(file_name, content_type)
        );
        let path = self.dir.join(&filename);

        fs::write(&path, bytes)
            .await
            .map_err(|e| CmsError::file_op(&path, e))?;

        info!("Stored upload {} ({} bytes)", filename, bytes.len());

        Ok(UploadedImage {
            url: format!("{}/{}", self.public_prefix, filename),
            filename,
        })
    }
}

/// Extension from the client file name, else the MIME subtype.
fn extension_for(file_name: &str, content_type: &str) -> String {
    let from_name = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));

    let from_type = content_type
        .split(';')
        .next()
        .and_then(|t| t.trim().strip_prefix("image/"))
        .map(|sub| sub.split('+').next().unwrap_or(sub))
        .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name
        .or(from_type)
        .unwrap_or("img")
        .to_ascii_lowercase()
}
