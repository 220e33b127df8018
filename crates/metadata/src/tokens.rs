//! Token metadata directory validation.
//!
//! Token indices come from filename stems, never from listing order. The
//! set of indices must be exactly `1..=N` for N JSON files.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::MetadataError;

/// A token metadata file with its parsed index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFile {
    pub index: u64,
    pub path: PathBuf,
}

/// Lists the `*.json` files directly inside `dir`, ordered by index, and
/// validates that their indices are contiguous from 1.
///
/// Non-JSON entries and subdirectories are ignored.
pub fn scan_token_indices(dir: &Path) -> Result<Vec<TokenFile>, MetadataError> {
    if !dir.is_dir() {
        return Err(MetadataError::NotADirectory(dir.to_path_buf()));
    }

    let io_err = |source| MetadataError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !entry.file_type().map_err(io_err)?.is_file() || !is_json {
            debug!(path = %path.display(), "ignoring non-metadata entry");
            continue;
        }

        let index = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(parse_index)
            .ok_or_else(|| MetadataError::MalformedTokenMetadataFilename(path.clone()))?;

        files.push(TokenFile { index, path });
    }

    files.sort_by_key(|f| f.index);

    let count = files.len();
    let present = |i: u64| files.binary_search_by_key(&i, |f| f.index).is_ok();
    let missing: Vec<u64> = (1..=count as u64).filter(|&i| !present(i)).collect();

    if !missing.is_empty() {
        let unexpected = files
            .iter()
            .map(|f| f.index)
            .filter(|&i| i > count as u64)
            .collect();
        return Err(MetadataError::NonContiguousTokenIndices {
            count,
            missing,
            unexpected,
        });
    }

    Ok(files)
}

/// Parses a canonical positive integer (no sign, no leading zeros).
fn parse_index(stem: &str) -> Option<u64> {
    let index: u64 = stem.parse().ok()?;
    (index > 0 && index.to_string() == stem).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dir_with(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"{}").unwrap();
        }
        dir
    }

    #[test]
    fn contiguous_indices_sorted_numerically() {
        let dir = dir_with(&["10.json", "2.json", "1.json", "3.json", "4.json", "5.json",
            "6.json", "7.json", "8.json", "9.json"]);
        let files = scan_token_indices(dir.path()).unwrap();

        let indices: Vec<u64> = files.iter().map(|f| f.index).collect();
        assert_eq!(indices, (1..=10).collect::<Vec<_>>());
        assert_eq!(files[9].path, dir.path().join("10.json"));
    }

    #[test]
    fn gap_is_fatal() {
        let dir = dir_with(&["1.json", "2.json", "4.json"]);
        match scan_token_indices(dir.path()).unwrap_err() {
            MetadataError::NonContiguousTokenIndices {
                count,
                missing,
                unexpected,
            } => {
                assert_eq!(count, 3);
                assert_eq!(missing, vec![3]);
                assert_eq!(unexpected, vec![4]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_integer_stem_is_malformed() {
        for bad in ["abc.json", "0.json", "01.json", "-1.json", "1.5.json"] {
            let dir = dir_with(&["1.json", bad]);
            let err = scan_token_indices(dir.path()).unwrap_err();
            assert!(
                matches!(err, MetadataError::MalformedTokenMetadataFilename(_)),
                "{bad} should be malformed, got {err:?}"
            );
        }
    }

    #[test]
    fn non_json_entries_ignored() {
        let dir = dir_with(&["1.json", "2.json", ".DS_Store", "notes.txt"]);
        fs::create_dir(dir.path().join("drafts")).unwrap();

        let files = scan_token_indices(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn empty_dir_has_no_tokens() {
        let dir = TempDir::new().unwrap();
        assert!(scan_token_indices(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_dir_rejected() {
        let result = scan_token_indices(Path::new("/nonexistent/metadata/tokens"));
        assert!(matches!(result, Err(MetadataError::NotADirectory(_))));
    }
}
