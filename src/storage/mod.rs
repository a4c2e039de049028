//! Storage abstraction for site sources and build output.
//!
//! Every component of the build pipeline reads and writes through the
//! [`Storage`] trait rather than touching the filesystem directly, so a
//! site can be built from (and into) any backend that implements it.
//!
//! # Backends
//!
//! | Backend           | Purpose                                     |
//! |-------------------|---------------------------------------------|
//! | [`LocalStorage`]  | Filesystem-rooted storage used by the CLI   |
//! | [`MemoryStorage`] | In-memory storage for tests and embedding   |
//!
//! # Path contract
//!
//! All paths are `/`-separated and relative to the storage root, with no
//! leading slash. Write operations create missing parent directories.
//! Implementations must reject paths escaping the root (`..` components).

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

// ============================================================================
// Errors
// ============================================================================

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("path not found: `{0}`")]
    NotFound(String),

    #[error("path already exists: `{0}`")]
    AlreadyExists(String),

    #[error("invalid path: `{0}`")]
    InvalidPath(String),

    #[error("IO error on `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }
}

// ============================================================================
// Storage Trait
// ============================================================================

/// Async storage backend.
///
/// Reads on missing paths return [`StorageError::NotFound`]. Writes
/// overwrite existing files and create parent directories as needed.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Whether a file or directory exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Read a file as UTF-8 text.
    async fn read_text(&self, path: &str) -> Result<String, StorageError>;

    /// Read a file as raw bytes.
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Open a file as an async byte stream.
    async fn open_stream(
        &self,
        path: &str,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, StorageError>;

    /// Write UTF-8 text, overwriting any existing file.
    async fn write_text(&self, path: &str, content: &str) -> Result<(), StorageError>;

    /// Write raw bytes, overwriting any existing file.
    async fn write_bytes(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Write from an async byte stream, overwriting any existing file.
    async fn write_stream(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), StorageError>;

    /// List files under `path` matching `pattern`, optionally recursive.
    ///
    /// Returned paths are `/`-separated relative to the storage root, in
    /// deterministic order. A missing directory yields an empty list.
    async fn list_files(
        &self,
        path: &str,
        pattern: &str,
        recursive: bool,
    ) -> Result<Vec<String>, StorageError>;

    /// List immediate subdirectories of `path`.
    async fn list_directories(&self, path: &str) -> Result<Vec<String>, StorageError>;

    /// Create a directory (and parents).
    async fn create_directory(&self, path: &str) -> Result<(), StorageError>;

    /// Delete a file. Missing files are an error.
    async fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    /// Delete a directory; non-empty directories require `recursive`.
    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), StorageError>;

    /// Copy a file within the backend.
    ///
    /// Fails with [`StorageError::AlreadyExists`] when the destination
    /// exists and `overwrite` is false.
    async fn copy_file(&self, src: &str, dst: &str, overwrite: bool)
        -> Result<(), StorageError>;
}

// ============================================================================
// Path Helpers
// ============================================================================

/// Join path segments with `/`, skipping empty segments.
pub fn combine(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Glob-lite file name matching: `*` matches everything, `*.ext` matches
/// by extension, anything else is an exact file name match.
pub(crate) fn matches_pattern(file_name: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return file_name.ends_with(suffix);
    }
    file_name == pattern
}
