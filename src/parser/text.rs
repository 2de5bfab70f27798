// file: src/parser/text.rs
// description: slug generation, heading text cleanup and html stripping
// reference: https://docs.rs/regex

use super::patterns::{
    BOLD_STARS, BOLD_UNDERSCORES, HTML_ENTITY, HTML_TAG, HYPHEN_RUN, IMAGE, INLINE_CODE,
    ITALIC_STAR, ITALIC_UNDERSCORE, LINK, NON_SLUG_CHARS, WHITESPACE_RUN,
};
use std::collections::HashSet;

/// Id used when a heading slugifies to nothing.
pub const FALLBACK_HEADING_ID: &str = "section";

/// Lowercase, hyphenated, URL-safe identifier for `text`.
///
/// Only ASCII word characters, whitespace and hyphens survive; whitespace runs
/// become one hyphen, hyphen runs collapse and edge hyphens are trimmed.
/// The result is a fixed point: `slugify(&slugify(x)) == slugify(x)`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUN.replace_all(&kept, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Removes inline markdown formatting from heading text, keeping the visible
/// words: emphasis markers, image syntax (alt text kept), link syntax (label
/// kept) and inline code backticks.
pub fn clean_heading_text(text: &str) -> String {
    let text = BOLD_STARS.replace_all(text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");
    let text = IMAGE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Drops every tag, decodes the handful of named entities editors actually
/// produce and discards any other entity.
pub fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, "");
    let decoded = HTML_ENTITY.replace_all(&text, |caps: &regex::Captures| {
        match caps[1].to_ascii_lowercase().as_str() {
            "nbsp" => " ",
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            "#039" | "#39" | "apos" => "'",
            _ => "",
        }
        .to_string()
    });
    decoded.trim().to_string()
}

/// Strips emoji and pictographic symbols that authors sprinkle into headings.
pub fn strip_symbols(text: &str) -> String {
    let kept: String = text.chars().filter(|c| !is_pictographic(*c)).collect();
    WHITESPACE_RUN.replace_all(kept.trim(), " ").to_string()
}

fn is_pictographic(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xFE00..=0xFE0F | 0x20E3 | 0x200D
    )
}

/// Escapes text for use inside a double-quoted html attribute.
pub fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Hands out heading ids in document order.
///
/// With deduplication on, a repeated id gets `-2`, `-3`, ... appended so every
/// anchor on the page is unique.
#[derive(Debug, Default)]
pub struct HeadingIdAllocator {
    dedupe: bool,
    used: HashSet<String>,
}

impl HeadingIdAllocator {
    pub fn new(dedupe: bool) -> Self {
        Self {
            dedupe,
            used: HashSet::new(),
        }
    }

    pub fn allocate(&mut self, base: &str) -> String {
        let base = if base.is_empty() {
            FALLBACK_HEADING_ID
        } else {
            base
        };

        if self.used.insert(base.to_string()) || !self.dedupe {
            return base.to_string();
        }

        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Records an id chosen by the author; it is kept verbatim.
    pub fn reserve(&mut self, id: &str) -> String {
        self.used.insert(id.to_string());
        id.to_string()
    }
}
