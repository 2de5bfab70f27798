// file: src/parser/patterns.rs
// description: compiled regex patterns for markdown and html text cleanup
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Slug construction (ASCII word characters only)
    pub static ref NON_SLUG_CHARS: Regex = Regex::new(
        r"[^A-Za-z0-9_\s-]"
    ).expect("NON_SLUG_CHARS regex is valid");

    pub static ref WHITESPACE_RUN: Regex = Regex::new(
        r"\s+"
    ).expect("WHITESPACE_RUN regex is valid");

    pub static ref HYPHEN_RUN: Regex = Regex::new(
        r"-+"
    ).expect("HYPHEN_RUN regex is valid");

    // Inline markdown formatting
    pub static ref BOLD_STARS: Regex = Regex::new(
        r"\*\*(.+?)\*\*"
    ).expect("BOLD_STARS regex is valid");

    pub static ref ITALIC_STAR: Regex = Regex::new(
        r"\*(.+?)\*"
    ).expect("ITALIC_STAR regex is valid");

    pub static ref BOLD_UNDERSCORES: Regex = Regex::new(
        r"__(.+?)__"
    ).expect("BOLD_UNDERSCORES regex is valid");

    pub static ref ITALIC_UNDERSCORE: Regex = Regex::new(
        r"_(.+?)_"
    ).expect("ITALIC_UNDERSCORE regex is valid");

    pub static ref IMAGE: Regex = Regex::new(
        r"!\[(.*?)\]\(.+?\)"
    ).expect("IMAGE regex is valid");

    pub static ref LINK: Regex = Regex::new(
        r"\[(.+?)\]\(.+?\)"
    ).expect("LINK regex is valid");

    pub static ref INLINE_CODE: Regex = Regex::new(
        r"`(.+?)`"
    ).expect("INLINE_CODE regex is valid");

    // Rendered html
    pub static ref HTML_TAG: Regex = Regex::new(
        r"<[^>]*>"
    ).expect("HTML_TAG regex is valid");

    pub static ref HTML_ENTITY: Regex = Regex::new(
        r"(?i)&(#[0-9]+|#x[0-9a-f]+|[a-z]+);"
    ).expect("HTML_ENTITY regex is valid");

    // Bare links in text
    pub static ref BARE_URL: Regex = Regex::new(
        r#"https?://[^\s<>"]*[^\s<>".,;:!?')\]]"#
    ).expect("BARE_URL regex is valid");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_url_trims_trailing_punctuation() {
        let m = BARE_URL.find("see https://example.com/docs.").unwrap();
        assert_eq!(m.as_str(), "https://example.com/docs");
    }
}
