//! File I/O utilities.
//!
//! Document reading with encoding checks, article lookup inside an item
//! directory, and the [`ResourceSource`] abstraction the resource collectors
//! list and read through.

use crate::{ArticleError, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Directory listing and reading, relative to a document's directory.
///
/// `subdir` is a single directory name such as `images` or `files`.
pub trait ResourceSource {
    /// Names of the regular files in `subdir`, in collection order.
    ///
    /// Returns `Ok(None)` when the subdirectory does not exist.
    fn list_entries(&self, subdir: &str) -> Result<Option<Vec<String>>>;

    /// Bytes of `subdir/name`.
    fn read_entry(&self, subdir: &str, name: &str) -> Result<Vec<u8>>;
}

/// [`ResourceSource`] backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsResourceSource {
    root: PathBuf,
}

impl FsResourceSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceSource for FsResourceSource {
    /// Files are returned sorted by name; subdirectories are skipped.
    fn list_entries(&self, subdir: &str) -> Result<Option<Vec<String>>> {
        let dir = self.root.join(subdir);
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => {
                    tracing::warn!(dir = %dir.display(), name = ?name, "skipping file with non UTF-8 name");
                }
            }
        }
        names.sort();
        Ok(Some(names))
    }

    fn read_entry(&self, subdir: &str, name: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.root.join(subdir).join(name))?)
    }
}

/// In-memory [`ResourceSource`]. Entries are listed sorted by name.
///
/// # Example
///
/// ```rust
/// use rst_article::core::io::{MemoryResourceSource, ResourceSource};
///
/// let source = MemoryResourceSource::new().with_entry("files", "notes.txt", b"hi".to_vec());
/// assert_eq!(source.list_entries("files").unwrap(), Some(vec!["notes.txt".to_string()]));
/// assert_eq!(source.list_entries("images").unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceSource {
    dirs: IndexMap<String, IndexMap<String, Vec<u8>>>,
}

impl MemoryResourceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `subdir` as present even if it holds no entries.
    pub fn with_dir(mut self, subdir: impl Into<String>) -> Self {
        self.dirs.entry(subdir.into()).or_default();
        self
    }

    pub fn with_entry(mut self, subdir: impl Into<String>, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(subdir, name, data);
        self
    }

    pub fn insert(&mut self, subdir: impl Into<String>, name: impl Into<String>, data: Vec<u8>) {
        self.dirs.entry(subdir.into()).or_default().insert(name.into(), data);
    }
}

impl ResourceSource for MemoryResourceSource {
    fn list_entries(&self, subdir: &str) -> Result<Option<Vec<String>>> {
        Ok(self.dirs.get(subdir).map(|entries| {
            let mut names: Vec<String> = entries.keys().cloned().collect();
            names.sort();
            names
        }))
    }

    fn read_entry(&self, subdir: &str, name: &str) -> Result<Vec<u8>> {
        self.dirs
            .get(subdir)
            .and_then(|entries| entries.get(name))
            .cloned()
            .ok_or_else(|| ArticleError::NotFound(Path::new(subdir).join(name)))
    }
}

/// Decode document bytes as UTF-8, dropping a leading byte order mark.
pub fn decode_document(bytes: Vec<u8>) -> Result<String> {
    let bytes = if bytes.starts_with(UTF8_BOM) {
        bytes[UTF8_BOM.len()..].to_vec()
    } else {
        bytes
    };
    String::from_utf8(bytes).map_err(|e| ArticleError::parsing_with_source("document is not valid UTF-8", e))
}

/// Read and decode a document.
///
/// # Errors
///
/// - `ArticleError::NotFound` if `path` does not exist
/// - `ArticleError::Io` for other I/O errors
/// - `ArticleError::Parsing` if the content is not UTF-8
pub fn read_document(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ArticleError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    decode_document(bytes)
}

/// Locate the article document inside an item directory.
///
/// Returns the first regular file, in name order, whose file name contains
/// the directory's own name (`post/post.rst` for `post/`).
///
/// # Errors
///
/// `ArticleError::NotFound` when the directory is missing or holds no such file.
pub fn find_article_path(item_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let item_dir = item_dir.as_ref();
    if !item_dir.is_dir() {
        return Err(ArticleError::NotFound(item_dir.to_path_buf()));
    }
    let absolute = std::fs::canonicalize(item_dir)?;
    let Some(dir_name) = absolute.file_name().and_then(|name| name.to_str()) else {
        return Err(ArticleError::NotFound(item_dir.to_path_buf()));
    };

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(item_dir)? {
        let path = entry?.path();
        if path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();

    candidates
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.contains(dir_name))
        })
        .ok_or_else(|| ArticleError::NotFound(item_dir.join(format!("{}.rst", dir_name))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_document_missing() {
        let err = read_document("/nonexistent/article.rst").unwrap_err();
        assert!(matches!(err, ArticleError::NotFound(_)));
    }

    #[test]
    fn test_read_document_strips_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.rst");
        fs::write(&path, b"\xEF\xBB\xBFTitle\n=====\n").unwrap();
        assert_eq!(read_document(&path).unwrap(), "Title\n=====\n");
    }

    #[test]
    fn test_invalid_utf8_is_parsing_error() {
        let err = decode_document(vec![b'a', 0xFF, b'b']).unwrap_err();
        assert!(matches!(err, ArticleError::Parsing { .. }));
    }

    #[test]
    fn test_fs_source_lists_sorted_files_only() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        fs::create_dir_all(images.join("nested")).unwrap();
        fs::write(images.join("b.gif"), b"b").unwrap();
        fs::write(images.join("a.gif"), b"a").unwrap();

        let source = FsResourceSource::new(dir.path());
        assert_eq!(
            source.list_entries("images").unwrap(),
            Some(vec!["a.gif".to_string(), "b.gif".to_string()])
        );
        assert_eq!(source.list_entries("files").unwrap(), None);
        assert_eq!(source.read_entry("images", "b.gif").unwrap(), b"b");
    }

    #[test]
    fn test_memory_source() {
        let source = MemoryResourceSource::new()
            .with_entry("files", "z.txt", b"z".to_vec())
            .with_entry("files", "a.txt", b"a".to_vec())
            .with_dir("images");

        assert_eq!(
            source.list_entries("files").unwrap(),
            Some(vec!["a.txt".to_string(), "z.txt".to_string()])
        );
        assert_eq!(source.list_entries("images").unwrap(), Some(Vec::new()));
        assert!(matches!(
            source.read_entry("files", "missing").unwrap_err(),
            ArticleError::NotFound(_)
        ));
    }

    #[test]
    fn test_find_article_path() {
        let root = tempdir().unwrap();
        let item = root.path().join("post");
        fs::create_dir(&item).unwrap();
        fs::write(item.join("notes.txt"), "x").unwrap();
        fs::write(item.join("post.rst"), "x").unwrap();

        let found = find_article_path(&item).unwrap();
        assert_eq!(found.file_name().unwrap(), "post.rst");
    }

    #[test]
    fn test_find_article_path_not_found() {
        let root = tempdir().unwrap();
        let item = root.path().join("empty-item");
        fs::create_dir(&item).unwrap();
        fs::write(item.join("other.rst"), "x").unwrap();

        let err = find_article_path(&item).unwrap_err();
        assert!(matches!(err, ArticleError::NotFound(_)));
        assert!(matches!(
            find_article_path(root.path().join("missing")).unwrap_err(),
            ArticleError::NotFound(_)
        ));
    }
}
