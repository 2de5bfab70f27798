// file: src/pipeline/processor.rs
// description: composes storage, heading extraction and rendering into read models
// reference: parses stored markdown, renders html and builds the table of contents

use crate::config::BlogConfig;
use crate::error::{CmsError, Result};
use crate::models::{HeadingItem, PostInput, RenderedPost, UpsertOutcome};
use crate::parser::{FrontmatterCodec, HeadingExtractor, MarkdownRenderer};
use crate::store::BlogStore;
use crate::utils::{OperationTimer, Validator};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckProblem {
    pub file: String,
    pub message: String,
}

/// Result of strictly validating every stored post.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub checked: usize,
    pub valid: usize,
    pub problems: Vec<CheckProblem>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

pub struct ContentPipeline {
    store: BlogStore,
    extractor: HeadingExtractor,
    renderer: MarkdownRenderer,
    codec: FrontmatterCodec,
}

impl ContentPipeline {
    pub fn new(store: BlogStore, extractor: HeadingExtractor, renderer: MarkdownRenderer) -> Self {
        Self {
            store,
            extractor,
            renderer,
            codec: FrontmatterCodec::new(),
        }
    }

    pub fn from_config(config: &BlogConfig) -> Self {
        Self::new(
            BlogStore::from_config(config),
            HeadingExtractor::from_config(config),
            MarkdownRenderer::from_config(config),
        )
    }

    pub fn store(&self) -> &BlogStore {
        &self.store
    }

    pub fn extractor(&self) -> &HeadingExtractor {
        &self.extractor
    }

    /// Html body and table of contents for a markdown document. Anchor ids in
    /// the html match the ids in the table of contents.
    pub fn render_markdown(&self, markdown: &str) -> (String, Vec<HeadingItem>) {
        let (html, anchors) = self.renderer.render_with_outline(markdown);
        (html, self.extractor.select(&anchors))
    }

    pub async fn render_post(&self, slug: &str) -> Result<RenderedPost> {
        let post = self.store.get_by_slug(slug).await?;
        let (html, toc) = self.render_markdown(&post.content);
        debug!("Rendered {} with {} toc entries", slug, toc.len());

        Ok(RenderedPost { post, html, toc })
    }

    /// Publishes a standalone markdown file. The file must carry every
    /// required frontmatter field; an existing post with the same slug is
    /// updated and keeps its date.
    pub async fn import_file(&self, path: &Path) -> Result<UpsertOutcome> {
        Validator::validate_markdown_extension(path)?;

        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| CmsError::file_op(path, e))?;
        let parsed = self
            .codec
            .parse(&raw)
            .map_err(|e| e.in_file(&path.display().to_string()))?;

        let outcome = self
            .store
            .upsert(PostInput::from_parsed(parsed.metadata, parsed.content))
            .await?;

        info!(
            "Imported {} as {}",
            path.display(),
            outcome.post.slug
        );
        Ok(outcome)
    }

    /// Strictly parses every stored post and reports what would break a
    /// reader: missing fields, malformed headers and slugs that do not match
    /// their file names.
    pub async fn check(&self) -> Result<CheckReport> {
        let timer = OperationTimer::new("check blog posts");
        let files = self.store.post_files().await?;
        let mut report = CheckReport::default();

        for path in files {
            report.checked += 1;
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            match self.check_file(&path).await {
                Ok(()) => report.valid += 1,
                Err(e) => {
                    warn!("{}: {}", file, e);
                    report.problems.push(CheckProblem {
                        file,
                        message: e.to_string(),
                    });
                }
            }
        }

        timer.finish_with_count(report.checked);
        Ok(report)
    }

    async fn check_file(&self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| CmsError::file_op(path, e))?;
        let parsed = self.codec.parse(&raw)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if parsed.metadata.slug != stem {
            return Err(CmsError::invalid(
                "slug",
                format!(
                    "slug \"{}\" does not match file name \"{}\"",
                    parsed.metadata.slug, stem
                ),
            ));
        }

        Validator::validate_slug(&stem)?;
        Validator::validate_content_not_empty(&parsed.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const POST: &str = "---\ntitle: \"Term Life 101\"\nexcerpt: \"Basics\"\ncategory: \"Life Insurance\"\ndate: \"March 1, 2024\"\nimage: \"/uploads/a.png\"\n---\n\n# Term Life 101\n\n## What It Is\n\nText.\n\n## What It Costs\n\n### Riders\n";

    fn pipeline(dir: &Path) -> ContentPipeline {
        let config = BlogConfig {
            content_dir: dir.to_path_buf(),
            ..crate::config::Config::default_config().blog
        };
        ContentPipeline::from_config(&config)
    }

    #[tokio::test]
    async fn test_render_post_builds_matching_toc() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("term-life-101.md"), POST).unwrap();
        let pipeline = pipeline(dir.path());

        let rendered = pipeline.render_post("term-life-101").await.unwrap();

        let ids: Vec<&str> = rendered.toc.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["what-it-is", "what-it-costs", "riders"]);
        for id in ids {
            assert!(rendered.html.contains(&format!("id=\"{id}\"")));
        }
        assert_eq!(rendered.post.title, "Term Life 101");
    }

    #[test]
    fn test_render_markdown_toc_follows_page_headings() {
        let pipeline = pipeline(Path::new("unused"));
        let markdown = "Setup\n-----\n\n    ## shell comment\n\n> ## Setup\n\n## my_var_name 🚀";

        let (html, toc) = pipeline.render_markdown(markdown);

        assert_eq!(
            toc,
            vec![
                HeadingItem::new(2, "Setup", "setup"),
                HeadingItem::new(2, "Setup", "setup-2"),
                HeadingItem::new(2, "my_var_name", "my_var_name"),
            ]
        );
        for heading in &toc {
            assert!(html.contains(&format!("id=\"{}\"", heading.id)));
        }
        assert!(html.contains("<pre><code>## shell comment"));
    }

    #[tokio::test]
    async fn test_render_missing_post_is_not_found() {
        let dir = tempdir().unwrap();
        let err = pipeline(dir.path()).render_post("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_import_file_publishes_post() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("draft.md");
        std::fs::write(&source, POST).unwrap();
        let pipeline = pipeline(&dir.path().join("blogs"));

        let outcome = pipeline.import_file(&source).await.unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.post.slug, "term-life-101");
        assert!(outcome.post.content.starts_with("# Term Life 101"));

        let again = pipeline.import_file(&source).await.unwrap();
        assert!(!again.created);
    }

    #[tokio::test]
    async fn test_import_rejects_incomplete_frontmatter() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("draft.md");
        std::fs::write(&source, "---\ntitle: Only\n---\nBody").unwrap();

        let err = pipeline(dir.path()).import_file(&source).await.unwrap_err();
        assert!(matches!(err, CmsError::Validation { ref field, .. } if field == "excerpt"));
    }

    #[tokio::test]
    async fn test_check_reports_problems() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("term-life-101.md"), POST).unwrap();
        std::fs::write(dir.path().join("renamed.md"), POST).unwrap();
        std::fs::write(dir.path().join("broken.md"), "nothing here").unwrap();

        let report = pipeline(dir.path()).check().await.unwrap();

        assert_eq!(report.checked, 3);
        assert_eq!(report.valid, 1);
        assert!(!report.is_clean());
        let files: Vec<&str> = report.problems.iter().map(|p| p.file.as_str()).collect();
        assert_eq!(files, vec!["broken.md", "renamed.md"]);
    }
}
