// file: src/parser/mod.rs
// description: markdown parsing module exports
// reference: internal module structure

pub mod frontmatter;
pub mod headings;
pub mod markdown;
pub mod patterns;
pub mod text;

pub use frontmatter::{Frontmatter, FrontmatterCodec, ParsedPost};
pub use headings::{HeadingExtractor, LevelRange};
pub use markdown::{HeadingAnchor, MarkdownRenderer, RenderOptions};
pub use text::{clean_heading_text, slugify, strip_html, strip_symbols};
