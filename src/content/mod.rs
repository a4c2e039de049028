//! Content parsing: frontmatter extraction and body conversion.
//!
//! Source files carry optional YAML frontmatter between `---` fences on
//! the first line. The fence handling is shared; converting the body to
//! HTML is delegated to a [`ContentParser`] selected by file extension.
//!
//! # Parsers
//!
//! | Parser             | Extensions        | Body handling          |
//! |--------------------|-------------------|------------------------|
//! | [`MarkdownParser`] | `md`, `markdown`  | CommonMark → HTML      |
//! | [`HtmlParser`]     | `html`, `htm`     | passed through verbatim|

mod html;
mod markdown;

pub use html::HtmlParser;
pub use markdown::MarkdownParser;

use crate::site::Metadata;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Content parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("frontmatter fence opened but never closed")]
    UnterminatedFrontmatter,

    #[error("invalid frontmatter")]
    Frontmatter(#[from] serde_yaml::Error),
}

// ============================================================================
// Parser Trait
// ============================================================================

/// Parsed source file: metadata plus HTML body.
#[derive(Debug, Clone)]
pub struct ParsedContent {
    pub meta: Metadata,
    pub body: String,
}

/// Converts one source format into metadata and an HTML body.
pub trait ContentParser: Send + Sync {
    /// Lowercase file extensions this parser handles.
    fn extensions(&self) -> &'static [&'static str];

    /// Parse raw file content into metadata and an HTML body. The source
    /// path is advisory, for diagnostics and path-aware formats.
    fn parse(&self, raw: &str, source_path: &str) -> Result<ParsedContent, ParseError>;
}

/// Extension-keyed parser lookup.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ContentParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with the built-in markdown and HTML parsers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MarkdownParser::new()));
        registry.register(Box::new(HtmlParser::new()));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn ContentParser>) {
        self.parsers.push(parser);
    }

    /// Find a parser for a source path by its extension.
    pub fn for_path(&self, path: &str) -> Option<&dyn ContentParser> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, extension) = name.rsplit_once('.')?;
        let extension = extension.to_lowercase();
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&extension.as_str()))
            .map(|p| p.as_ref())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Frontmatter
// ============================================================================

/// Split raw content into an optional frontmatter block and the body.
///
/// Frontmatter starts with `---` on the very first line and runs to the
/// next `---` line. Content without an opening fence is all body; an
/// opening fence without a closing one is an error.
pub fn split_frontmatter(raw: &str) -> Result<(Option<&str>, &str), ParseError> {
    let mut lines = raw.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((None, raw));
    };
    if first.trim_end() != "---" {
        return Ok((None, raw));
    }

    let mut offset = first.len();
    for line in lines {
        if line.trim_end() == "---" {
            let frontmatter = &raw[first.len()..offset];
            let body = &raw[offset + line.len()..];
            return Ok((Some(frontmatter), body));
        }
        offset += line.len();
    }
    Err(ParseError::UnterminatedFrontmatter)
}

/// Deserialize a frontmatter block, treating an absent block as empty
/// metadata.
pub(crate) fn parse_metadata(frontmatter: Option<&str>) -> Result<Metadata, ParseError> {
    match frontmatter {
        Some(block) if !block.trim().is_empty() => Ok(serde_yaml::from_str(block)?),
        _ => Ok(Metadata::default()),
    }
}

// ============================================================================
// Tests
// ============================================================================
