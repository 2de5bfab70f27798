// file: src/parser/frontmatter.rs
// description: minimal key/value frontmatter codec for blog post files
// reference: internal file format (--- delimited header, one key: value per line)

use crate::error::{CmsError, Result};
use crate::models::PostMetadata;
use crate::parser::slugify;
use std::collections::HashMap;

pub const DELIMITER: &str = "---";

/// Fields every stored post must carry, in the order they are validated.
pub const REQUIRED_FIELDS: [&str; 5] = ["title", "excerpt", "category", "date", "image"];

pub struct FrontmatterCodec;

#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    pub fields: HashMap<String, String>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Builds metadata without validation; absent fields become empty strings
    /// and the slug falls back to `fallback_slug`.
    pub fn to_metadata(&self, fallback_slug: &str) -> PostMetadata {
        let field = |key: &str| self.get(key).unwrap_or_default().to_string();
        PostMetadata {
            title: field("title"),
            excerpt: field("excerpt"),
            category: field("category"),
            date: field("date"),
            image: field("image"),
            slug: self
                .get("slug")
                .map(str::to_string)
                .unwrap_or_else(|| fallback_slug.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPost {
    pub metadata: PostMetadata,
    pub content: String,
}

/// One line of the header block.
#[derive(Debug, PartialEq, Eq)]
enum HeaderLine<'a> {
    Blank,
    Comment,
    Entry(&'a str, String),
    Ignored,
}

impl<'a> HeaderLine<'a> {
    fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }
        if trimmed.starts_with('#') {
            return Self::Comment;
        }
        match trimmed.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                Self::Entry(key.trim(), unquote(value.trim()))
            }
            _ => Self::Ignored,
        }
    }
}

impl FrontmatterCodec {
    pub fn new() -> Self {
        Self
    }

    /// Splits raw file text into its header fields and the body that follows
    /// the closing delimiter. The single blank separator line written by
    /// [`serialize`](Self::serialize) is not part of the body.
    pub fn split<'a>(&self, raw: &'a str) -> Result<(Frontmatter, &'a str)> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw).trim_start();
        let mut lines = raw.split_inclusive('\n');

        let first = match lines.next() {
            Some(first) if first.trim_end() == DELIMITER => first,
            _ => return Err(parse_error("content must start with a frontmatter delimiter (---)")),
        };

        let mut offset = first.len();
        let mut fields = HashMap::new();
        let mut closed = false;

        for line in lines {
            offset += line.len();
            if line.trim_end() == DELIMITER {
                closed = true;
                break;
            }
            if let HeaderLine::Entry(key, value) = HeaderLine::classify(line) {
                fields.insert(key.to_string(), value);
            }
        }

        if !closed {
            return Err(parse_error("missing closing delimiter (---)"));
        }

        let rest = &raw[offset..];
        let body = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
            .unwrap_or(rest);

        Ok((Frontmatter { fields }, body))
    }

    /// Strict parse: every required field must be present and non-empty.
    pub fn parse(&self, raw: &str) -> Result<ParsedPost> {
        let (frontmatter, body) = self.split(raw)?;

        for field in REQUIRED_FIELDS {
            if frontmatter.get(field).is_none() {
                return Err(CmsError::Validation {
                    field: field.to_string(),
                    message: format!("Missing required field in frontmatter: {}", field),
                });
            }
        }

        let fallback = slugify(frontmatter.get("title").unwrap_or_default());
        Ok(ParsedPost {
            metadata: frontmatter.to_metadata(&fallback),
            content: body.to_string(),
        })
    }

    pub fn serialize(&self, metadata: &PostMetadata, body: &str) -> String {
        let mut out = String::with_capacity(body.len() + 256);
        out.push_str(DELIMITER);
        out.push('\n');

        let fields = [
            ("title", &metadata.title),
            ("excerpt", &metadata.excerpt),
            ("category", &metadata.category),
            ("date", &metadata.date),
            ("image", &metadata.image),
            ("slug", &metadata.slug),
        ];
        for (key, value) in fields {
            if key == "slug" && value.is_empty() {
                continue;
            }
            out.push_str(&format!("{}: \"{}\"\n", key, escape(value)));
        }

        out.push_str(DELIMITER);
        out.push_str("\n\n");
        out.push_str(body);
        out
    }
}

impl Default for FrontmatterCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_error(message: &str) -> CmsError {
    CmsError::Parse {
        file: "frontmatter".to_string(),
        message: message.to_string(),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Strips one layer of matching quotes; escapes are only meaningful inside
/// quoted values.
fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let quote = bytes[0];
        if (quote == b'"' || quote == b'\'') && bytes[bytes.len() - 1] == quote {
            return unescape(&value[1..value.len() - 1]);
        }
    }
    value.to_string()
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metadata() -> PostMetadata {
        PostMetadata {
            title: "Term vs. Whole: \"Which\" Wins?".to_string(),
            excerpt: "A path C:\\policies and a colon: here".to_string(),
            category: "Life Insurance".to_string(),
            date: "November 15, 2024".to_string(),
            image: "/uploads/cover.png".to_string(),
            slug: "term-vs-whole".to_string(),
        }
    }

    fn edited(edit: impl FnOnce(&mut PostMetadata)) -> PostMetadata {
        let mut meta = metadata();
        edit(&mut meta);
        meta
    }

    #[test]
    fn test_round_trip() {
        let codec = FrontmatterCodec::new();
        let body = "# Heading\n\nSome *text*.\n\n---\n\nAfter a rule.\n";
        let raw = codec.serialize(&metadata(), body);

        let parsed = codec.parse(&raw).unwrap();
        assert_eq!(parsed.metadata, metadata());
        assert_eq!(parsed.content, body);
    }

    #[test]
    fn test_round_trip_samples() {
        let codec = FrontmatterCodec::new();
        let samples = [
            (metadata(), ""),
            (metadata(), "\n\nStarts after blank lines"),
            (metadata(), "---\nlooks like a delimiter"),
            (edited(|m| m.title = "It's a 'quoted' title".into()), "Body"),
            (edited(|m| m.excerpt = "back\\slash \\n not a newline \\".into()), "Body"),
            (edited(|m| m.excerpt = "line one\nline two\r\n".into()), "Body"),
            (edited(|m| m.category = "  padded  ".into()), "Body"),
            (edited(|m| m.title = "# not a comment: ---".into()), "Body"),
            (edited(|m| m.image = "\"/uploads/q.png\"".into()), "Body\n"),
        ];

        for (meta, body) in samples {
            let raw = codec.serialize(&meta, body);
            let parsed = codec.parse(&raw).unwrap();
            assert_eq!(parsed.metadata, meta, "metadata changed for {raw:?}");
            assert_eq!(parsed.content, body, "body changed for {raw:?}");
        }
    }

    #[test]
    fn test_round_trip_fills_missing_slug() {
        let codec = FrontmatterCodec::new();
        let mut meta = metadata();
        meta.slug = String::new();

        let parsed = codec.parse(&codec.serialize(&meta, "Body")).unwrap();
        assert_eq!(parsed.metadata.slug, "term-vs-whole-which-wins");
        assert_eq!(parsed.metadata.title, meta.title);
    }

    #[test]
    fn test_missing_category_names_field() {
        let codec = FrontmatterCodec::new();
        let raw = "---\ntitle: T\nexcerpt: E\ndate: D\nimage: I\n---\n\nBody";
        match codec.parse(raw) {
            Err(CmsError::Validation { field, .. }) => assert_eq!(field, "category"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_required_field_rejected() {
        let codec = FrontmatterCodec::new();
        let raw = "---\ntitle: \"\"\nexcerpt: E\ncategory: C\ndate: D\nimage: I\n---\nBody";
        match codec.parse(raw) {
            Err(CmsError::Validation { field, .. }) => assert_eq!(field, "title"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_opening_delimiter() {
        let codec = FrontmatterCodec::new();
        assert!(matches!(
            codec.parse("title: T\n---\nBody"),
            Err(CmsError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let codec = FrontmatterCodec::new();
        assert!(matches!(
            codec.split("---\ntitle: T\n\nBody"),
            Err(CmsError::Parse { .. })
        ));
    }

    #[test]
    fn test_header_grammar() {
        let codec = FrontmatterCodec::new();
        let raw = "---\n# a comment\n\ntitle: 'Single'\nno colon here\ntime: 10:30\nquoted: \"say \\\"hi\\\"\"\n---\nBody";
        let (fm, body) = codec.split(raw).unwrap();

        assert_eq!(fm.get("title"), Some("Single"));
        assert_eq!(fm.get("time"), Some("10:30"));
        assert_eq!(fm.get("quoted"), Some("say \"hi\""));
        assert_eq!(fm.fields.len(), 3);
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_leading_whitespace_and_crlf() {
        let codec = FrontmatterCodec::new();
        let raw = "\n\n---\r\ntitle: T\r\n---\r\n\r\nBody\r\n";
        let (fm, body) = codec.split(raw).unwrap();
        assert_eq!(fm.get("title"), Some("T"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_to_metadata_defaults() {
        let codec = FrontmatterCodec::new();
        let (fm, _) = codec.split("---\ntitle: Only Title\n---\n").unwrap();
        let meta = fm.to_metadata("file-stem");
        assert_eq!(meta.title, "Only Title");
        assert_eq!(meta.category, "");
        assert_eq!(meta.slug, "file-stem");
    }
}
