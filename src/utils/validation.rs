// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{CmsError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    /// Returns the trimmed value, or a validation error naming `field` when it
    /// is absent or blank.
    pub fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(CmsError::missing_field(field)),
        }
    }

    pub fn validate_content_not_empty(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(CmsError::invalid("content", "Content cannot be empty"));
        }
        Ok(())
    }

    pub fn validate_slug(slug: &str) -> Result<()> {
        let is_valid = !slug.is_empty()
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && !slug.contains("--")
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

        if is_valid {
            Ok(())
        } else {
            Err(CmsError::invalid(
                "slug",
                format!("Slug must be lowercase kebab-case: {:?}", slug),
            ))
        }
    }

    pub fn validate_markdown_extension(path: &Path) -> Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") => Ok(()),
            _ => Err(CmsError::invalid(
                "file",
                format!("File is not a markdown file: {}", path.display()),
            )),
        }
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(CmsError::invalid(
                "directory",
                format!("Directory does not exist: {}", path.display()),
            ));
        }

        if !path.is_dir() {
            return Err(CmsError::invalid(
                "directory",
                format!("Path is not a directory: {}", path.display()),
            ));
        }

        Ok(())
    }

    pub fn validate_image_type(content_type: &str) -> Result<()> {
        if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(CmsError::invalid("file", "File must be an image"));
        }
        Ok(())
    }

    pub fn validate_size(size: usize, max_bytes: usize) -> Result<()> {
        if size > max_bytes {
            return Err(CmsError::invalid(
                "file",
                format!("File must be less than {}MB", max_bytes / (1024 * 1024)),
            ));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(CmsError::invalid(
                "url",
                format!("Invalid URL format: {}", url),
            ));
        }
        Ok(())
    }

    pub fn validate_port(port: u16) -> Result<()> {
        if port == 0 {
            return Err(CmsError::invalid("port", "Port cannot be 0"));
        }
        Ok(())
    }
}
