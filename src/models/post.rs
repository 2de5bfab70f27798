// file: src/models/post.rs
// description: blog post records, listing summaries and authoring input
// reference: internal data structures

use crate::models::HeadingItem;
use crate::parser::slugify;
use serde::{Deserialize, Serialize};

/// Frontmatter fields of a stored post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub date: String,
    pub image: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub date: String,
    pub image: String,
    pub content: String,
}

impl BlogPost {
    pub fn from_parts(metadata: PostMetadata, content: String) -> Self {
        Self {
            slug: metadata.slug,
            title: metadata.title,
            excerpt: metadata.excerpt,
            category: metadata.category,
            date: metadata.date,
            image: metadata.image,
            content,
        }
    }

    pub fn metadata(&self) -> PostMetadata {
        PostMetadata {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            category: self.category.clone(),
            date: self.date.clone(),
            image: self.image.clone(),
            slug: self.slug.clone(),
        }
    }

    pub fn summary(&self) -> BlogSummary {
        BlogSummary {
            slug: self.slug.clone(),
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            category: self.category.clone(),
            category_slug: slugify(&self.category),
            date: self.date.clone(),
            image: self.image.clone(),
        }
    }
}

/// Listing view of a post; the body is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub category_slug: String,
    pub date: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub slug: String,
    pub count: usize,
}

/// Authoring payload for create-or-update. Every field is optional on the
/// wire so a missing one surfaces as a field-specific validation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostInput {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
}

impl PostInput {
    pub fn from_parsed(metadata: PostMetadata, content: String) -> Self {
        Self {
            title: Some(metadata.title),
            excerpt: Some(metadata.excerpt),
            category: Some(metadata.category),
            image: Some(metadata.image),
            content: Some(content),
            slug: Some(metadata.slug),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpsertOutcome {
    pub post: BlogPost,
    pub created: bool,
}

/// A post ready for display: rendered html plus its table of contents.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPost {
    pub post: BlogPost,
    pub html: String,
    pub toc: Vec<HeadingItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlogPost {
        BlogPost {
            slug: "term-vs-whole".to_string(),
            title: "Term vs Whole".to_string(),
            excerpt: "Which policy fits".to_string(),
            category: "Life Insurance Basics".to_string(),
            date: "November 15, 2024".to_string(),
            image: "/uploads/cover.png".to_string(),
            content: "## Intro".to_string(),
        }
    }

    #[test]
    fn test_summary_carries_category_slug() {
        let summary = sample().summary();
        assert_eq!(summary.category_slug, "life-insurance-basics");
        assert_eq!(summary.slug, "term-vs-whole");
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let json = serde_json::to_value(sample().summary()).unwrap();
        assert_eq!(json["categorySlug"], "life-insurance-basics");
        assert!(json.get("content").is_none());
    }

    #[test]
    fn test_metadata_round_trip() {
        let post = sample();
        let rebuilt = BlogPost::from_parts(post.metadata(), post.content.clone());
        assert_eq!(rebuilt, post);
    }
}
