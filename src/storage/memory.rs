//! In-memory storage backend.
//!
//! Backs the end-to-end build tests and lets embedders run the pipeline
//! without touching disk. Directories are implicit: a directory exists
//! while a file lives under it, plus any explicitly created ones.

use super::{matches_pattern, Storage, StorageError};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    directories: BTreeSet<String>,
}

/// Storage backend over an in-memory map.
///
/// Enumeration order is deterministic (lexicographic by path).
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate(path: &str) -> Result<(), StorageError> {
        if path.starts_with('/') || path.split('/').any(|s| s == "..") {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(())
    }

    /// Whether `candidate` lives under the directory `prefix`.
    fn under(candidate: &str, prefix: &str) -> bool {
        prefix.is_empty() || candidate.starts_with(&format!("{prefix}/"))
    }

    /// Path remainder of `candidate` relative to directory `prefix`.
    fn remainder<'a>(candidate: &'a str, prefix: &str) -> &'a str {
        if prefix.is_empty() {
            candidate
        } else {
            &candidate[prefix.len() + 1..]
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Self::validate(path)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.files.contains_key(path)
            || inner.directories.contains(path)
            || inner.files.keys().any(|k| Self::under(k, path)))
    }

    async fn read_text(&self, path: &str) -> Result<String, StorageError> {
        let bytes = self.read_bytes(path).await?;
        String::from_utf8(bytes).map_err(|e| {
            StorageError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        Self::validate(path)?;
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn open_stream(
        &self,
        path: &str,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, StorageError> {
        let bytes = self.read_bytes(path).await?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    async fn write_text(&self, path: &str, content: &str) -> Result<(), StorageError> {
        self.write_bytes(path, content.as_bytes()).await
    }

    async fn write_bytes(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        Self::validate(path)?;
        let mut inner = self.inner.lock().unwrap();
        inner.files.insert(path.to_string(), content.to_vec());
        Ok(())
    }

    async fn write_stream(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), StorageError> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        self.write_bytes(path, &buffer).await
    }

    async fn list_files(
        &self,
        path: &str,
        pattern: &str,
        recursive: bool,
    ) -> Result<Vec<String>, StorageError> {
        Self::validate(path)?;
        let inner = self.inner.lock().unwrap();
        let files = inner
            .files
            .keys()
            .filter(|k| Self::under(k, path))
            .filter(|k| recursive || !Self::remainder(k, path).contains('/'))
            .filter(|k| {
                let name = k.rsplit('/').next().unwrap_or(k);
                matches_pattern(name, pattern)
            })
            .cloned()
            .collect();
        Ok(files)
    }

    async fn list_directories(&self, path: &str) -> Result<Vec<String>, StorageError> {
        Self::validate(path)?;
        let inner = self.inner.lock().unwrap();
        let mut dirs = BTreeSet::new();
        for key in inner.files.keys().chain(inner.directories.iter()) {
            if !Self::under(key, path) {
                continue;
            }
            let remainder = Self::remainder(key, path);
            if let Some((first, _)) = remainder.split_once('/') {
                dirs.insert(super::combine(&[path, first]));
            } else if inner.directories.contains(key.as_str()) && key.as_str() != path {
                dirs.insert(key.clone());
            }
        }
        Ok(dirs.into_iter().collect())
    }

    async fn create_directory(&self, path: &str) -> Result<(), StorageError> {
        Self::validate(path)?;
        let mut inner = self.inner.lock().unwrap();
        inner.directories.insert(path.to_string());
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        Self::validate(path)?;
        let mut inner = self.inner.lock().unwrap();
        inner
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), StorageError> {
        Self::validate(path)?;
        let mut inner = self.inner.lock().unwrap();
        let occupied = inner.files.keys().any(|k| Self::under(k, path));
        if occupied && !recursive {
            return Err(StorageError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, "directory not empty"),
            ));
        }
        inner.files.retain(|k, _| !Self::under(k, path));
        inner
            .directories
            .retain(|d| d != path && !Self::under(d, path));
        Ok(())
    }

    async fn copy_file(
        &self,
        src: &str,
        dst: &str,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        Self::validate(src)?;
        Self::validate(dst)?;
        let mut inner = self.inner.lock().unwrap();
        if !overwrite && inner.files.contains_key(dst) {
            return Err(StorageError::AlreadyExists(dst.to_string()));
        }
        let content = inner
            .files
            .get(src)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(src.to_string()))?;
        inner.files.insert(dst.to_string(), content);
        Ok(())
    }
}
