//! Source scanning for publishing.
//!
//! Recursively walks a directory (or takes a single file) and produces the
//! list of local files with relative paths normalized to forward slashes.

use std::path::{Path, PathBuf};

use crate::error::PublishError;

/// A local file queued for publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    /// Path relative to the scanned root, `/`-separated.
    pub relative_path: String,
}

/// Scans a file or directory and returns its files sorted by relative path.
///
/// A single file is returned with its file name as the relative path.
pub fn scan_source(source: &Path) -> Result<Vec<LocalFile>, PublishError> {
    let metadata = match std::fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PublishError::SourceNotFound(source.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();

    if metadata.is_file() {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PublishError::SourceNotFound(source.to_path_buf()))?;
        files.push(LocalFile {
            path: source.to_path_buf(),
            relative_path: name,
        });
    } else {
        walk_dir(source, source, &mut files)?;
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    }

    Ok(files)
}

fn walk_dir(root: &Path, current: &Path, files: &mut Vec<LocalFile>) -> Result<(), PublishError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            walk_dir(root, &path, files)?;
        } else if metadata.is_file() {
            let rel_path = path.strip_prefix(root).map_err(std::io::Error::other)?;

            // Normalize to forward slashes.
            let relative_path = rel_path.to_string_lossy().replace('\\', "/");
            files.push(LocalFile {
                path,
                relative_path,
            });
        }
    }

    Ok(())
}
