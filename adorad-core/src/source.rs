use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::CoreError;

/// File extension of Adorad sources.
pub const SOURCE_EXTENSION: &str = "ad";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Raw bytes. Sources are Latin-1, so no encoding is checked on read.
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|source| CoreError::SourceIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(SourceFile {
            path: path.to_path_buf(),
            contents,
        })
    }

    /// Path used in locations and diagnostics.
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Collect every `.ad` file under `root`, sorted by path. A file root is
/// returned as-is whatever its extension.
pub fn load_source_files(root: impl AsRef<Path>) -> Result<Vec<SourceFile>, CoreError> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(CoreError::MissingSource(root.to_path_buf()));
    }
    if root.is_file() {
        return Ok(vec![SourceFile::read(root)?]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| CoreError::SourceIo {
            path: err.path().unwrap_or(root).to_path_buf(),
            source: err.into(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && is_source_file(path) {
            files.push(SourceFile::read(path)?);
        }
    }

    debug!(root = %root.display(), files = files.len(), "loaded source files");
    Ok(files)
}
