// file: src/parser/markdown.rs
// description: markdown to html rendering with pulldown-cmark and anchored headings
// reference: https://docs.rs/pulldown-cmark

use super::patterns::BARE_URL;
use super::text::{HeadingIdAllocator, escape_attr, slugify, strip_html};
use crate::config::BlogConfig;
use pulldown_cmark::{CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd, html};

const LINK_ICON: &str = r#"<svg class="heading-anchor-icon" fill="none" stroke="currentColor" viewBox="0 0 24 24" aria-hidden="true"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M13.828 10.172a4 4 0 00-5.656 0l-4 4a4 4 0 105.656 5.656l1.102-1.101m-.758-4.899a4 4 0 005.656 0l4-4a4 4 0 00-5.656-5.656l-1.1 1.1"/></svg>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Single newlines inside a paragraph become `<br />`.
    pub hard_breaks: bool,
    /// Tables, strikethrough, task lists and bare-URL autolinks.
    pub gfm: bool,
    /// `$inline$` and `$$display$$` math spans.
    pub math: bool,
    pub dedupe_ids: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hard_breaks: true,
            gfm: true,
            math: true,
            dedupe_ids: true,
        }
    }
}

pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &BlogConfig) -> Self {
        Self::with_options(RenderOptions {
            hard_breaks: config.hard_breaks,
            gfm: true,
            math: config.enable_math,
            dedupe_ids: config.dedupe_heading_ids,
        })
    }

    pub fn render(&self, markdown: &str) -> String {
        self.render_with_outline(markdown).0
    }

    /// Renders `markdown` and returns the headings it anchored, in document
    /// order, with the ids used in the html.
    pub fn render_with_outline(&self, markdown: &str) -> (String, Vec<HeadingAnchor>) {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let (events, anchors) = self.anchor_headings(self.transform(parser));

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());

        (html_output, anchors)
    }

    /// Headings of `markdown` exactly as `render` would anchor them, without
    /// producing the page.
    pub fn outline(&self, markdown: &str) -> Vec<HeadingAnchor> {
        let parser = Parser::new_ext(markdown, self.parser_options());
        self.anchor_headings(self.transform(parser)).1
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        if self.options.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.options.math {
            options.insert(Options::ENABLE_MATH);
        }
        options
    }

    /// Applies break semantics and links bare URLs in plain text. Text inside
    /// links and code blocks is left alone.
    fn transform<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut link_depth = 0usize;
        let mut in_code_block = false;

        for event in parser {
            match event {
                Event::Start(Tag::Link { .. }) => {
                    link_depth += 1;
                    events.push(event);
                }
                Event::End(TagEnd::Link) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    in_code_block = true;
                    events.push(event);
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    events.push(event);
                }
                Event::SoftBreak if self.options.hard_breaks => {
                    events.push(Event::HardBreak);
                }
                Event::Text(text)
                    if self.options.gfm
                        && link_depth == 0
                        && !in_code_block
                        && BARE_URL.is_match(&text) =>
                {
                    push_autolinked(&mut events, &text);
                }
                other => events.push(other),
            }
        }

        events
    }

    /// Gives every heading a stable id and replaces it with the wrapped,
    /// anchor-linked html block.
    fn anchor_headings<'a>(&self, events: Vec<Event<'a>>) -> (Vec<Event<'a>>, Vec<HeadingAnchor>) {
        let mut ids = HeadingIdAllocator::new(self.options.dedupe_ids);
        let mut output = Vec::with_capacity(events.len());
        let mut anchors = Vec::new();
        let mut open: Option<OpenHeading<'a>> = None;

        for event in events {
            match event {
                Event::Start(Tag::Heading {
                    level, id, classes, ..
                }) => {
                    open = Some(OpenHeading {
                        level: heading_number(level),
                        id,
                        classes,
                        inner: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(heading) = open.take() {
                        let (html, anchor) = heading.finish(&mut ids);
                        output.push(Event::Html(CowStr::from(html)));
                        anchors.push(anchor);
                    }
                }
                other => match open.as_mut() {
                    Some(heading) => heading.inner.push(other),
                    None => output.push(other),
                },
            }
        }

        (output, anchors)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// A heading as it appears on the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingAnchor {
    pub level: u8,
    pub id: String,
    /// Visible text with markup removed.
    pub text: String,
}

struct OpenHeading<'a> {
    level: u8,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    inner: Vec<Event<'a>>,
}

impl OpenHeading<'_> {
    fn finish(self, ids: &mut HeadingIdAllocator) -> (String, HeadingAnchor) {
        let mut inner = String::new();
        html::push_html(&mut inner, self.inner.into_iter());
        let text = strip_html(&inner);

        let id = match self.id.as_deref() {
            Some(existing) if !existing.is_empty() => ids.reserve(existing),
            _ => ids.allocate(&slugify(&text)),
        };
        let extra_classes: String = self.classes.iter().map(|c| format!(" {}", c)).collect();

        let html = wrap_heading(self.level, &id, &extra_classes, &inner, &text);
        let anchor = HeadingAnchor {
            level: self.level,
            id,
            text,
        };
        (html, anchor)
    }
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn push_autolinked<'a>(events: &mut Vec<Event<'a>>, text: &str) {
    let mut last = 0;
    for m in BARE_URL.find_iter(text) {
        if m.start() > last {
            events.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
        }
        let url = m.as_str().to_string();
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(url.clone()),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        events.push(Event::Text(CowStr::from(url)));
        events.push(Event::End(TagEnd::Link));
        last = m.end();
    }
    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

fn wrap_heading(level: u8, id: &str, extra_classes: &str, inner: &str, plain: &str) -> String {
    let accent = match level {
        2 => r#"<div class="heading-accent heading-accent-major"></div>"#,
        3 => r#"<div class="heading-accent heading-accent-minor"></div>"#,
        _ => "",
    };

    format!(
        r##"<div class="heading-block heading-block-h{level}"><h{level} id="{id}" class="heading{extra_classes}">{inner}<a href="#{id}" class="heading-anchor" aria-label="Link to {label}">{icon}</a></h{level}>{accent}</div>
"##,
        level = level,
        id = escape_attr(id),
        extra_classes = extra_classes,
        inner = inner,
        label = escape_attr(plain),
        icon = LINK_ICON,
        accent = accent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::HeadingExtractor;

    #[test]
    fn test_headings_get_ids_and_anchor_links() {
        let html = MarkdownRenderer::new().render("## Getting Started\n\nBody");
        assert!(html.contains(r##"<h2 id="getting-started" class="heading">Getting Started<a href="#getting-started""##));
        assert!(html.contains("heading-accent-major"));
        assert!(html.contains("<p>Body</p>"));
    }

    #[test]
    fn test_heading_text_and_level_unchanged() {
        let html = MarkdownRenderer::new().render("#### Fine *print*");
        assert!(html.contains("<h4 id=\"fine-print\""));
        assert!(html.contains("Fine <em>print</em><a href=\"#fine-print\""));
        assert!(html.contains("</h4>"));
    }

    #[test]
    fn test_every_level_is_anchored() {
        let html = MarkdownRenderer::new().render("# One\n\n###### Six");
        assert!(html.contains(r##"<h1 id="one" class="heading">One<a href="#one""##));
        assert!(html.contains(r##"<h6 id="six" class="heading">Six<a href="#six""##));
    }

    #[test]
    fn test_existing_id_reused() {
        let html = MarkdownRenderer::new().render("## Intro {#start-here .lead}");
        assert!(html.contains(r#"id="start-here""#));
        assert!(html.contains(r#"class="heading lead""#));
        assert!(html.contains(r##"href="#start-here""##));
    }

    #[test]
    fn test_entities_in_heading_ids() {
        let html = MarkdownRenderer::new().render("## Q&A");
        assert!(html.contains(r#"id="qa""#));
        assert!(html.contains(r#"aria-label="Link to Q&amp;A""#));
    }

    #[test]
    fn test_soft_breaks_become_br() {
        let html = MarkdownRenderer::new().render("line one\nline two");
        assert!(html.contains("line one<br />"));

        let html = MarkdownRenderer::with_options(RenderOptions {
            hard_breaks: false,
            ..RenderOptions::default()
        })
        .render("line one\nline two");
        assert!(!html.contains("<br"));
    }

    #[test]
    fn test_gfm_extensions() {
        let html = MarkdownRenderer::new().render(
            "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~ and https://example.com/page.",
        );
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains(r#"<a href="https://example.com/page">https://example.com/page</a>."#));
    }

    #[test]
    fn test_urls_in_links_and_code_untouched() {
        let html = MarkdownRenderer::new()
            .render("[site](https://example.com)\n\n```\nhttps://example.com\n```");
        assert_eq!(html.matches("<a href=").count(), 1);
        assert!(html.contains("<code>https://example.com\n</code>"));
    }

    #[test]
    fn test_math_degrades_without_failing() {
        let html = MarkdownRenderer::new().render("Premium is $x^2 + {$ per month");
        assert!(html.contains("<p>"));

        let html = MarkdownRenderer::new().render("Rate $r = 0.05$ applies");
        assert!(html.contains("math"));
    }

    #[test]
    fn test_duplicate_headings_match_extractor_ids() {
        let markdown = "# Overview\n\n## Overview\n\n### Details\n\n## Details";
        let html = MarkdownRenderer::new().render(markdown);
        let toc = HeadingExtractor::default().extract(markdown);

        for heading in toc {
            assert!(
                html.contains(&format!("id=\"{}\"", heading.id)),
                "missing anchor {}",
                heading.id
            );
        }
        assert!(html.contains(r#"id="overview-2""#));
        assert!(html.contains(r#"id="details-2""#));
    }

    #[test]
    fn test_outline_lists_anchored_headings() {
        let renderer = MarkdownRenderer::new();
        let markdown = "# Title\n\nIntro\n=====\n\n## Step *one* {#first}\n\n    ## code";

        let (html, anchors) = renderer.render_with_outline(markdown);

        let ids: Vec<&str> = anchors.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["title", "intro", "first"]);
        assert_eq!(anchors[2].text, "Step one");
        assert_eq!(anchors[1].level, 1);
        assert_eq!(renderer.outline(markdown), anchors);
        assert!(html.contains("<pre><code>## code"));
    }
}
