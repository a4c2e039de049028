//! Stylesheet compilation and the asset compiler trait.
//!
//! The build's asset stage feeds the entry stylesheet through an
//! [`AssetCompiler`]. The built-in [`CssCompiler`] inlines `@import`
//! statements recursively and optionally minifies the result.

use crate::storage::{combine, Storage, StorageError};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;
use thiserror::Error;

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*@import\s+"([^"]+)"\s*;"#).unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Output formatting for compiled stylesheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    Expanded,
    Compressed,
}

/// Asset compilation errors
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("import cycle through `{0}`")]
    ImportCycle(String),

    #[error("asset storage error")]
    Storage(#[from] StorageError),
}

/// Compiles one stylesheet entry into final CSS.
#[async_trait]
pub trait AssetCompiler: Send + Sync {
    /// Compile `source` (located at `source_path` in `storage`, for
    /// resolving relative imports) into a single stylesheet.
    async fn compile(
        &self,
        source: &str,
        source_path: &str,
        storage: &dyn Storage,
        style: OutputStyle,
    ) -> Result<String, AssetError>;
}

/// Plain-CSS compiler: inlines `@import "x";` lines relative to the
/// importing file, detects cycles, and strips whitespace in
/// [`OutputStyle::Compressed`] mode.
#[derive(Default)]
pub struct CssCompiler;

impl CssCompiler {
    pub fn new() -> Self {
        Self
    }

    fn inline<'a>(
        &'a self,
        source: &'a str,
        source_path: &'a str,
        storage: &'a dyn Storage,
        visiting: &'a mut HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<String, AssetError>> + Send + 'a>> {
        Box::pin(async move {
            let directory = source_path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");

            // Regex replacement can't await, so resolve imports in two
            // passes: collect, then splice.
            let mut imports = Vec::new();
            for captures in IMPORT_RE.captures_iter(source) {
                let whole = captures.get(0).unwrap();
                let target = &captures[1];
                let mut path = combine(&[directory, target]);
                if !path.rsplit('/').next().unwrap_or(&path).contains('.') {
                    path.push_str(".css");
                }
                imports.push((whole.range(), path));
            }

            let mut out = String::with_capacity(source.len());
            let mut cursor = 0;
            for (range, path) in imports {
                if !visiting.insert(path.clone()) {
                    return Err(AssetError::ImportCycle(path));
                }
                let imported = storage.read_text(&path).await?;
                let inlined = self.inline(&imported, &path, storage, visiting).await?;
                visiting.remove(&path);

                out.push_str(&source[cursor..range.start]);
                out.push_str(&inlined);
                cursor = range.end;
            }
            out.push_str(&source[cursor..]);
            Ok(out)
        })
    }

    fn compress(css: &str) -> String {
        let stripped = COMMENT_RE.replace_all(css, "");
        let mut out = String::with_capacity(stripped.len());
        let mut pending_space = false;
        for token in stripped.split_whitespace() {
            if pending_space {
                out.push(' ');
            }
            out.push_str(token);
            pending_space = true;
        }
        for separator in ['{', '}', ';', ':', ','] {
            out = out.replace(&format!(" {separator}"), &separator.to_string());
            out = out.replace(&format!("{separator} "), &separator.to_string());
        }
        out
    }
}

#[async_trait]
impl AssetCompiler for CssCompiler {
    async fn compile(
        &self,
        source: &str,
        source_path: &str,
        storage: &dyn Storage,
        style: OutputStyle,
    ) -> Result<String, AssetError> {
        let mut visiting = HashSet::from([source_path.to_string()]);
        let inlined = self
            .inline(source, source_path, storage, &mut visiting)
            .await?;
        Ok(match style {
            OutputStyle::Expanded => inlined,
            OutputStyle::Compressed => Self::compress(&inlined),
        })
    }
}
