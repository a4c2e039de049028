//! Raw HTML content parser.

use super::{parse_metadata, split_frontmatter, ContentParser, ParseError, ParsedContent};

/// Passes the body through untouched; only the frontmatter is consumed.
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentParser for HtmlParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["html", "htm"]
    }

    fn parse(&self, raw: &str, _source_path: &str) -> Result<ParsedContent, ParseError> {
        let (frontmatter, body) = split_frontmatter(raw)?;
        let meta = parse_metadata(frontmatter)?;
        Ok(ParsedContent {
            meta,
            body: body.to_string(),
        })
    }
}
