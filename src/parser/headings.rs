// file: src/parser/headings.rs
// description: heading extraction for tables of contents
// reference: CommonMark ATX and setext headings

use super::markdown::{HeadingAnchor, MarkdownRenderer, RenderOptions};
use super::text::strip_symbols;
use crate::config::BlogConfig;
use crate::models::HeadingItem;
use std::ops::RangeInclusive;

/// Inclusive range of heading levels that make it into a table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRange {
    pub min: u8,
    pub max: u8,
}

impl LevelRange {
    /// Authoring preview: everything below the title down to h4.
    pub const EDITOR: LevelRange = LevelRange { min: 2, max: 4 };
    /// Public article page: h2 sections and h3 subsections.
    pub const ARTICLE: LevelRange = LevelRange { min: 2, max: 3 };

    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, level: u8) -> bool {
        self.as_range().contains(&level)
    }

    fn as_range(&self) -> RangeInclusive<u8> {
        self.min..=self.max
    }
}

impl Default for LevelRange {
    fn default() -> Self {
        Self::ARTICLE
    }
}

/// Builds tables of contents from markdown bodies.
///
/// Headings are read from the same parse the renderer uses, so indented code,
/// fenced code, setext underlines, blockquotes and `{#id .class}` attribute
/// blocks are treated exactly as on the rendered page.
#[derive(Debug, Clone)]
pub struct HeadingExtractor {
    levels: LevelRange,
    strip_symbols: bool,
    dedupe_ids: bool,
    math: bool,
}

impl HeadingExtractor {
    pub fn new(levels: LevelRange) -> Self {
        Self {
            levels,
            strip_symbols: false,
            dedupe_ids: true,
            math: true,
        }
    }

    pub fn from_config(config: &BlogConfig) -> Self {
        Self::new(LevelRange::new(config.toc_min_level, config.toc_max_level))
            .with_symbol_stripping(config.strip_heading_symbols)
            .with_id_dedupe(config.dedupe_heading_ids)
            .with_math(config.enable_math)
    }

    pub fn with_symbol_stripping(mut self, enabled: bool) -> Self {
        self.strip_symbols = enabled;
        self
    }

    pub fn with_id_dedupe(mut self, enabled: bool) -> Self {
        self.dedupe_ids = enabled;
        self
    }

    /// Must match the renderer's math setting for ids to line up when
    /// headings contain `$...$` spans.
    pub fn with_math(mut self, enabled: bool) -> Self {
        self.math = enabled;
        self
    }

    pub fn levels(&self) -> LevelRange {
        self.levels
    }

    /// Headings of `markdown` inside the level range, in document order.
    ///
    /// Ids are allocated over every heading, including the ones filtered out,
    /// so they line up with the anchors the renderer emits for the same body.
    pub fn extract(&self, markdown: &str) -> Vec<HeadingItem> {
        let renderer = MarkdownRenderer::with_options(RenderOptions {
            math: self.math,
            dedupe_ids: self.dedupe_ids,
            ..RenderOptions::default()
        });
        self.select(&renderer.outline(markdown))
    }

    /// Table of contents entries for headings a renderer already anchored.
    pub fn select(&self, anchors: &[HeadingAnchor]) -> Vec<HeadingItem> {
        anchors
            .iter()
            .filter(|anchor| self.levels.contains(anchor.level))
            .filter_map(|anchor| {
                let text = if self.strip_symbols {
                    strip_symbols(&anchor.text)
                } else {
                    anchor.text.clone()
                };
                (!text.is_empty()).then(|| HeadingItem::new(anchor.level, text, anchor.id.clone()))
            })
            .collect()
    }
}

impl Default for HeadingExtractor {
    fn default() -> Self {
        Self::new(LevelRange::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_excludes_title_heading() {
        let extractor = HeadingExtractor::new(LevelRange::EDITOR);
        let headings = extractor.extract("# Title\n## Intro\n### Sub\nSome text");

        assert_eq!(
            headings,
            vec![
                HeadingItem::new(2, "Intro", "intro"),
                HeadingItem::new(3, "Sub", "sub"),
            ]
        );
    }

    #[test]
    fn test_article_range_drops_h4() {
        let markdown = "## One\n#### Deep\n### Two\n##### Deeper";
        let article = HeadingExtractor::new(LevelRange::ARTICLE).extract(markdown);
        let editor = HeadingExtractor::new(LevelRange::EDITOR).extract(markdown);

        let levels: Vec<u8> = article.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![2, 3]);
        let levels: Vec<u8> = editor.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![2, 4, 3]);
    }

    #[test]
    fn test_cleans_formatting_and_builds_ids() {
        let headings = HeadingExtractor::default()
            .extract("## **Why** you need [coverage](https://example.com) `now`");
        assert_eq!(headings[0].text, "Why you need coverage now");
        assert_eq!(headings[0].id, "why-you-need-coverage-now");
    }

    #[test]
    fn test_duplicate_ids_are_suffixed() {
        let headings = HeadingExtractor::default().extract("## Overview\n## Overview\n### Overview");
        let ids: Vec<&str> = headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["overview", "overview-2", "overview-3"]);
    }

    #[test]
    fn test_filtered_headings_still_reserve_ids() {
        let headings = HeadingExtractor::default().extract("# Overview\n## Overview");
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].id, "overview-2");
    }

    #[test]
    fn test_dedupe_can_be_disabled() {
        let headings = HeadingExtractor::default()
            .with_id_dedupe(false)
            .extract("## Overview\n## Overview");
        assert_eq!(headings[0].id, headings[1].id);
    }

    #[test]
    fn test_skips_fenced_code() {
        let markdown = "## Real\n```bash\n# not a heading\n## nor this\n```\n## Also Real";
        let texts: Vec<String> = HeadingExtractor::default()
            .extract(markdown)
            .into_iter()
            .map(|h| h.text)
            .collect();
        assert_eq!(texts, vec!["Real", "Also Real"]);
    }

    #[test]
    fn test_explicit_id_and_closing_hashes() {
        let headings = HeadingExtractor::default()
            .extract("## Custom Part {#custom}\n## Closed ##\n## Styled {.lead #styled}\n## Plain {.note}");
        assert_eq!(headings[0], HeadingItem::new(2, "Custom Part", "custom"));
        assert_eq!(headings[1], HeadingItem::new(2, "Closed", "closed"));
        assert_eq!(headings[2], HeadingItem::new(2, "Styled", "styled"));
        assert_eq!(headings[3], HeadingItem::new(2, "Plain", "plain"));
    }

    #[test]
    fn test_symbol_stripping() {
        let headings = HeadingExtractor::default()
            .with_symbol_stripping(true)
            .extract("## 🔹 Key Facts\n## 📌");
        assert_eq!(headings, vec![HeadingItem::new(2, "Key Facts", "key-facts")]);
    }

    #[test]
    fn test_requires_space_after_hashes() {
        assert!(HeadingExtractor::default().extract("##NoSpace\n#tag").is_empty());
    }

    #[test]
    fn test_indented_code_is_not_a_heading() {
        let headings = HeadingExtractor::default().extract("Para\n\n    ## not a heading\n\n## Real");
        assert_eq!(headings, vec![HeadingItem::new(2, "Real", "real")]);

        let headings = HeadingExtractor::default().extract("   ## Three spaces");
        assert_eq!(headings, vec![HeadingItem::new(2, "Three spaces", "three-spaces")]);
    }

    #[test]
    fn test_intraword_underscores_kept() {
        let headings = HeadingExtractor::default().extract("## my_var_name setting");
        assert_eq!(headings[0].id, "my_var_name-setting");
        assert_eq!(headings[0].text, "my_var_name setting");
    }

    #[test]
    fn test_setext_and_blockquote_headings() {
        let markdown = "Overview\n--------\n\n> ## Overview\n\n## Overview";
        let ids: Vec<String> = HeadingExtractor::default()
            .extract(markdown)
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["overview", "overview-2", "overview-3"]);
    }

    fn assert_toc_matches_html(markdown: &str) {
        let html = MarkdownRenderer::new().render(markdown);
        let toc = HeadingExtractor::new(LevelRange::new(1, 6)).extract(markdown);
        let html_ids: Vec<&str> = html
            .split("<h")
            .skip(1)
            .filter_map(|tag| tag.split_once(" id=\"").map(|(_, rest)| rest))
            .filter_map(|rest| rest.split_once('"').map(|(id, _)| id))
            .collect();
        let toc_ids: Vec<&str> = toc.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(toc_ids, html_ids, "toc and html disagree for {markdown:?}");
    }

    #[test]
    fn test_toc_ids_match_rendered_anchors() {
        let samples = [
            "## my_var_name setting\n\n## __init__ method",
            "Para\n\n    ## not a heading\n\n## Real",
            "Overview\n---\n\n## Overview",
            "> ## Quoted\n\n## Quoted",
            "## 🚀 Launch 🚀\n\n## Launch",
            "## Q&A and <b>tags</b>\n\n## Fees ~~old~~ $x$",
            "## Custom {#picked}\n\n## Picked {.note}\n\n## Closed ##",
            "```\n## fenced\n```\n\n## After *emphasis* and `code`",
            "## See https://example.com/page\n\n## [Linked](https://example.com)",
        ];
        for markdown in samples {
            assert_toc_matches_html(markdown);
        }
    }
}
