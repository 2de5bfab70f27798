// file: src/store/blog_store.rs
// description: file-backed blog post storage, one markdown file per slug
// reference: https://docs.rs/tokio/latest/tokio/fs

use crate::config::BlogConfig;
use crate::error::{CmsError, Result};
use crate::models::{BlogPost, BlogSummary, CategoryCount, PostInput, UpsertOutcome};
use crate::parser::{FrontmatterCodec, slugify};
use crate::utils::{OperationTimer, Validator};
use chrono::{DateTime, Local, NaiveDate};
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

const POST_EXTENSION: &str = "md";

const SLOW_LISTING: Duration = Duration::from_secs(2);

/// Date formats accepted when ordering posts. New posts are written with the
/// first one.
const DATE_FORMATS: [&str; 5] = ["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d", "%m/%d/%Y", "%d %B %Y"];

/// Stores posts as `<slug>.md` files in a single directory.
///
/// There is no locking: two concurrent writes to the same slug race and the
/// last rename wins. Each write lands in a temporary file first, so readers
/// see either the old or the new file, never a partial one.
pub struct BlogStore {
    dir: PathBuf,
    codec: FrontmatterCodec,
    concurrency: usize,
}

impl BlogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            codec: FrontmatterCodec::new(),
            concurrency: 8,
        }
    }

    pub fn from_config(config: &BlogConfig) -> Self {
        Self::new(config.content_dir.clone()).with_concurrency(config.list_concurrency)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CmsError::file_op(&self.dir, e))
    }

    pub fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", slug, POST_EXTENSION))
    }

    /// Every `.md` file in the content directory, sorted by name.
    pub async fn post_files(&self) -> Result<Vec<PathBuf>> {
        self.ensure_dir().await?;

        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| CmsError::file_op(&self.dir, e))?;
        let mut files = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CmsError::file_op(&self.dir, e))?
        {
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            let is_post = path.extension().and_then(|e| e.to_str()) == Some(POST_EXTENSION);

            if is_post && !hidden && entry.file_type().await.is_ok_and(|t| t.is_file()) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Reads one stored file. Missing header fields default to empty strings.
    /// Posts are addressed by file name, so the slug is always the file stem.
    pub async fn read_post(&self, path: &Path) -> Result<BlogPost> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| CmsError::file_op(path, e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let (frontmatter, body) = self.codec.split(&raw).map_err(|e| e.in_file(&file_name))?;
        let mut metadata = frontmatter.to_metadata(&stem);
        if metadata.slug != stem {
            warn!(
                "{} declares slug {:?}; serving it as {:?} to match the file name",
                file_name, metadata.slug, stem
            );
            metadata.slug = stem;
        }

        Ok(BlogPost::from_parts(metadata, body.trim().to_string()))
    }

    /// Summaries of every readable post, newest first. Files that fail to read
    /// or parse are logged and skipped.
    pub async fn list(&self) -> Result<Vec<BlogSummary>> {
        let timer = OperationTimer::new("list blog posts");
        let files = self.post_files().await?;

        let results = stream::iter(files)
            .map(|path| async move {
                let result = self.read_post(&path).await;
                (path, result)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut posts = Vec::with_capacity(results.len());
        for (path, result) in results {
            match result {
                Ok(post) => posts.push(post),
                Err(e) => warn!("Skipping unreadable post {}: {}", path.display(), e),
            }
        }

        posts.sort_by(newest_first);
        timer.warn_if_slow(SLOW_LISTING, "reading the content directory");
        timer.finish_with_count(posts.len());

        Ok(posts.iter().map(BlogPost::summary).collect())
    }

    /// Posts whose slugified category equals `category_slug`.
    pub async fn list_by_category(&self, category_slug: &str) -> Result<Vec<BlogSummary>> {
        let posts = self.list().await?;
        Ok(posts
            .into_iter()
            .filter(|post| post.category_slug == category_slug)
            .collect())
    }

    pub async fn categories(&self) -> Result<Vec<CategoryCount>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for post in self.list().await? {
            if post.category.is_empty() {
                continue;
            }
            *counts.entry(post.category).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(name, count)| CategoryCount {
                slug: slugify(&name),
                name,
                count,
            })
            .collect())
    }

    /// Looks a post up by slug. An absent post is `Ok(None)`; a present but
    /// malformed file is a parse error.
    pub async fn find(&self, slug: &str) -> Result<Option<BlogPost>> {
        if Validator::validate_slug(slug).is_err() {
            debug!("Rejecting lookup for malformed slug {:?}", slug);
            return Ok(None);
        }

        self.ensure_dir().await?;
        let path = self.path_for(slug);
        if !fs::try_exists(&path)
            .await
            .map_err(|e| CmsError::file_op(&path, e))?
        {
            return Ok(None);
        }

        self.read_post(&path).await.map(Some)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<BlogPost> {
        self.find(slug)
            .await?
            .ok_or_else(|| CmsError::not_found(slug))
    }

    /// Creates or replaces the post addressed by the input's slug, or by the
    /// slugified title when no slug is given. Updates keep the original date.
    pub async fn upsert(&self, input: PostInput) -> Result<UpsertOutcome> {
        let title = Validator::require("title", input.title.as_deref())?;
        let excerpt = Validator::require("excerpt", input.excerpt.as_deref())?;
        let category = Validator::require("category", input.category.as_deref())?;
        let content = input
            .content
            .as_deref()
            .ok_or_else(|| CmsError::missing_field("content"))?;
        Validator::validate_content_not_empty(content)?;
        let image = Validator::require("image", input.image.as_deref())?;

        let slug = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => slugify(explicit),
            None => slugify(title),
        };
        if slug.is_empty() {
            return Err(CmsError::invalid(
                "slug",
                "Unable to derive a slug; provide one with letters or digits",
            ));
        }

        self.ensure_dir().await?;
        let path = self.path_for(&slug);
        let created = !fs::try_exists(&path)
            .await
            .map_err(|e| CmsError::file_op(&path, e))?;

        let existing_date = if created {
            None
        } else {
            match self.read_post(&path).await {
                Ok(existing) => Some(existing.date).filter(|d| !d.is_empty()),
                Err(e) => {
                    warn!("Overwriting unreadable post {}: {}", path.display(), e);
                    None
                }
            }
        };

        let post = BlogPost {
            slug: slug.clone(),
            title: title.to_string(),
            excerpt: excerpt.to_string(),
            category: category.to_string(),
            date: existing_date.unwrap_or_else(today),
            image: image.to_string(),
            content: content.trim().to_string(),
        };

        let raw = self.codec.serialize(&post.metadata(), &post.content);
        self.write_atomic(&slug, &path, &raw).await?;

        if created {
            info!("Created blog post {}", slug);
        } else {
            info!("Updated blog post {}", slug);
        }

        Ok(UpsertOutcome { post, created })
    }

    pub async fn delete(&self, slug: &str) -> Result<()> {
        if Validator::validate_slug(slug).is_err() {
            return Err(CmsError::not_found(slug));
        }

        let path = self.path_for(slug);
        if !fs::try_exists(&path)
            .await
            .map_err(|e| CmsError::file_op(&path, e))?
        {
            return Err(CmsError::not_found(slug));
        }

        fs::remove_file(&path)
            .await
            .map_err(|e| CmsError::file_op(&path, e))?;

        info!("Deleted blog post {}", slug);
        Ok(())
    }

    async fn write_atomic(&self, slug: &str, path: &Path, contents: &str) -> Result<()> {
        let tmp = self.dir.join(format!(".{}.{}.tmp", slug, Uuid::new_v4().simple()));

        fs::write(&tmp, contents)
            .await
            .map_err(|e| CmsError::file_op(&tmp, e))?;

        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CmsError::file_op(path, e));
        }

        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}

/// Date in the format new posts are stamped with, e.g. "November 5, 2024".
pub fn today() -> String {
    Local::now().format("%B %-d, %Y").to_string()
}

pub fn parse_post_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(date)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Newest first; undated posts sink to the end, ties break on slug.
fn newest_first(a: &BlogPost, b: &BlogPost) -> Ordering {
    parse_post_date(&b.date)
        .cmp(&parse_post_date(&a.date))
        .then_with(|| a.slug.cmp(&b.slug))
}
