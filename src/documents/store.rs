//! Filesystem-backed document store.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::extract;
use crate::error::DocumentError;

/// Default storage directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Document storage rooted at a single directory.
///
/// Document identifiers are plain file names inside the root; names that
/// contain path separators or parent components are rejected.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| DocumentError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Returns the storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists stored document names, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<String>, DocumentError> {
        let entries = std::fs::read_dir(&self.root).map_err(|source| DocumentError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Returns `true` if a document with this name exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok_and(|p| p.is_file())
    }

    /// Writes `content` under `name`, replacing any existing document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidName`] for unsafe names, or
    /// [`DocumentError::Io`] if the write fails.
    pub fn save_upload(&self, name: &str, content: &[u8]) -> Result<PathBuf, DocumentError> {
        let path = self.resolve(name)?;
        std::fs::write(&path, content).map_err(|source| DocumentError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(document = name, bytes = content.len(), "document stored");
        Ok(path)
    }

    /// Extracts the text of a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if the document is absent, or the
    /// extraction error for its format.
    pub fn extract_text(&self, name: &str) -> Result<String, DocumentError> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(DocumentError::NotFound {
                name: name.to_string(),
            });
        }
        extract::extract_text(&path)
    }

    /// Maps a document name to a path inside the root.
    fn resolve(&self, name: &str) -> Result<PathBuf, DocumentError> {
        let candidate = Path::new(name);
        let mut components = candidate.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(candidate)),
            _ => Err(DocumentError::InvalidName {
                name: name.to_string(),
            }),
        }
    }
}
