//! Filesystem-backed storage rooted at a directory.

use super::{matches_pattern, Storage, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncRead;
use walkdir::WalkDir;

/// Storage backend over a filesystem directory.
///
/// All trait paths resolve inside `root`; paths with `..` components are
/// rejected before touching the filesystem.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage path into an absolute filesystem path.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(path.to_string())),
            }
        }
        Ok(self.root.join(relative))
    }

    /// Convert an absolute filesystem path back to a `/`-separated
    /// storage path.
    fn relativize(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }

    async fn ensure_parent(&self, path: &str, resolved: &Path) -> Result<(), StorageError> {
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(path, e))?;
        }
        Ok(())
    }

    fn map_read_error(path: &str, source: std::io::Error) -> StorageError {
        if source.kind() == ErrorKind::NotFound {
            StorageError::NotFound(path.to_string())
        } else {
            StorageError::io(path, source)
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let resolved = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&resolved)
            .await
            .map_err(|e| StorageError::io(path, e))?)
    }

    async fn read_text(&self, path: &str) -> Result<String, StorageError> {
        let resolved = self.resolve(path)?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| Self::map_read_error(path, e))
    }

    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve(path)?;
        tokio::fs::read(&resolved)
            .await
            .map_err(|e| Self::map_read_error(path, e))
    }

    async fn open_stream(
        &self,
        path: &str,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, StorageError> {
        let resolved = self.resolve(path)?;
        let file = tokio::fs::File::open(&resolved)
            .await
            .map_err(|e| Self::map_read_error(path, e))?;
        Ok(Box::new(file))
    }

    async fn write_text(&self, path: &str, content: &str) -> Result<(), StorageError> {
        self.write_bytes(path, content.as_bytes()).await
    }

    async fn write_bytes(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        self.ensure_parent(path, &resolved).await?;
        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn write_stream(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        self.ensure_parent(path, &resolved).await?;
        let mut file = tokio::fs::File::create(&resolved)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        tokio::io::copy(reader, &mut file)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        Ok(())
    }

    async fn list_files(
        &self,
        path: &str,
        pattern: &str,
        recursive: bool,
    ) -> Result<Vec<String>, StorageError> {
        let resolved = self.resolve(path)?;
        if !resolved.is_dir() {
            return Ok(Vec::new());
        }

        let depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(&resolved)
            .max_depth(depth)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                StorageError::io(path, e.into_io_error().unwrap_or_else(|| ErrorKind::Other.into()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !matches_pattern(&name, pattern) {
                continue;
            }
            if let Some(relative) = self.relativize(entry.path()) {
                files.push(relative);
            }
        }
        Ok(files)
    }

    async fn list_directories(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let resolved = self.resolve(path)?;
        if !resolved.is_dir() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        let mut entries = tokio::fs::read_dir(&resolved)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(path, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::io(path, e))?;
            if file_type.is_dir() {
                if let Some(relative) = self.relativize(&entry.path()) {
                    dirs.push(relative);
                }
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    async fn create_directory(&self, path: &str) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        tokio::fs::create_dir_all(&resolved)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        tokio::fs::remove_file(&resolved)
            .await
            .map_err(|e| Self::map_read_error(path, e))
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        let result = if recursive {
            tokio::fs::remove_dir_all(&resolved).await
        } else {
            tokio::fs::remove_dir(&resolved).await
        };
        result.map_err(|e| Self::map_read_error(path, e))
    }

    async fn copy_file(
        &self,
        src: &str,
        dst: &str,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        let src_resolved = self.resolve(src)?;
        let dst_resolved = self.resolve(dst)?;

        if !tokio::fs::try_exists(&src_resolved)
            .await
            .map_err(|e| StorageError::io(src, e))?
        {
            return Err(StorageError::NotFound(src.to_string()));
        }
        if !overwrite
            && tokio::fs::try_exists(&dst_resolved)
                .await
                .map_err(|e| StorageError::io(dst, e))?
        {
            return Err(StorageError::AlreadyExists(dst.to_string()));
        }

        self.ensure_parent(dst, &dst_resolved).await?;
        tokio::fs::copy(&src_resolved, &dst_resolved)
            .await
            .map_err(|e| StorageError::io(dst, e))?;
        Ok(())
    }
}
