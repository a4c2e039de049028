//! Markdown content parser.

use super::{parse_metadata, split_frontmatter, ContentParser, ParseError, ParsedContent};
use pulldown_cmark::{html, Options, Parser};

/// CommonMark parser with tables, footnotes, strikethrough and task
/// lists enabled.
pub struct MarkdownParser {
    options: Options,
}

impl MarkdownParser {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }

    fn to_html(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentParser for MarkdownParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["md", "markdown"]
    }

    fn parse(&self, raw: &str, _source_path: &str) -> Result<ParsedContent, ParseError> {
        let (frontmatter, body) = split_frontmatter(raw)?;
        let meta = parse_metadata(frontmatter)?;
        Ok(ParsedContent {
            meta,
            body: self.to_html(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_frontmatter() {
        let raw = "---\ntitle: Hello World\ntags: [rust, web]\n---\n\n# Heading\n\nSome *text*.\n";
        let parsed = MarkdownParser::new().parse(raw, "test.md").unwrap();

        assert_eq!(parsed.meta.title.as_deref(), Some("Hello World"));
        assert_eq!(parsed.meta.tags, vec!["rust", "web"]);
        assert!(parsed.body.contains("<h1>Heading</h1>"));
        assert!(parsed.body.contains("<em>text</em>"));
    }

    #[test]
    fn test_parse_without_frontmatter() {
        let parsed = MarkdownParser::new().parse("Plain paragraph.", "test.md").unwrap();
        assert!(parsed.meta.title.is_none());
        assert!(parsed.body.contains("<p>Plain paragraph.</p>"));
    }

    #[test]
    fn test_tables_enabled() {
        let raw = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let parsed = MarkdownParser::new().parse(raw, "test.md").unwrap();
        assert!(parsed.body.contains("<table>"));
    }

    #[test]
    fn test_strikethrough_enabled() {
        let parsed = MarkdownParser::new().parse("~~gone~~", "test.md").unwrap();
        assert!(parsed.body.contains("<del>gone</del>"));
    }
}
