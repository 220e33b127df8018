//! Rewrites metadata image fields to published URLs.
//!
//! Every URL written here is derived from a base URL plus a fixed file name
//! or a token index, so documents always point at the uploaded objects.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::document::{ContractMetadata, TokenMetadata, read_document, write_document};
use crate::error::MetadataError;
use crate::tokens::scan_token_indices;

pub const CONTRACT_IMAGE_FILE: &str = "image.jpeg";
pub const BANNER_IMAGE_FILE: &str = "banner_image.jpeg";
pub const FEATURED_IMAGE_FILE: &str = "featured_image.jpeg";

/// Joins a base URL and a file name.
pub fn image_url(base_url: &str, file: &str) -> String {
    format!("{}/{file}", base_url.trim_end_matches('/'))
}

/// Image file name of a token.
pub fn token_image_file(index: u64) -> String {
    format!("{index}.jpeg")
}

/// Sets the collection name and the three contract image URLs, and drops
/// repeated collaborator addresses.
pub fn rewrite_contract_metadata(
    mut document: ContractMetadata,
    collection_name: &str,
    image_base_url: &str,
) -> ContractMetadata {
    document.name = collection_name.to_string();
    document.image = image_url(image_base_url, CONTRACT_IMAGE_FILE);
    document.banner_image = image_url(image_base_url, BANNER_IMAGE_FILE);
    document.featured_image = image_url(image_base_url, FEATURED_IMAGE_FILE);
    dedup_collaborators(&mut document.collaborators);
    document
}

/// Keeps the first occurrence of each address. Hex addresses compare
/// case-insensitively.
fn dedup_collaborators(collaborators: &mut Vec<String>) {
    let mut seen = HashSet::new();
    collaborators.retain(|address| seen.insert(address.trim().to_ascii_lowercase()));
}

/// Loads the contract metadata at `path`, rewrites it and writes it back.
pub fn rewrite_contract_metadata_file(
    path: &Path,
    collection_name: &str,
    image_base_url: &str,
) -> Result<ContractMetadata, MetadataError> {
    let document: ContractMetadata = read_document(path)?;
    let document = rewrite_contract_metadata(document, collection_name, image_base_url);
    write_document(path, &document)?;

    info!(path = %path.display(), image = %document.image, "contract metadata rewritten");
    Ok(document)
}

/// Points a token's `image` at `{image_base_url}/{index}.jpeg`.
pub fn rewrite_token_metadata(
    mut document: TokenMetadata,
    index: u64,
    image_base_url: &str,
) -> TokenMetadata {
    document.image = image_url(image_base_url, &token_image_file(index));
    document
}

/// A token document after rewriting.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenToken {
    pub index: u64,
    pub path: PathBuf,
    pub document: TokenMetadata,
}

/// Rewrites every token document in `dir`.
///
/// The directory is validated and every document parsed before the first
/// write, so a malformed directory leaves all files untouched. A failure
/// while writing may leave earlier files rewritten; rewriting is
/// idempotent, so the batch is re-run as a whole.
pub fn rewrite_token_metadata_batch(
    dir: &Path,
    image_base_url: &str,
) -> Result<Vec<RewrittenToken>, MetadataError> {
    let files = scan_token_indices(dir)?;

    let rewritten = files
        .into_iter()
        .map(|file| {
            let document: TokenMetadata = read_document(&file.path)?;
            Ok(RewrittenToken {
                index: file.index,
                document: rewrite_token_metadata(document, file.index, image_base_url),
                path: file.path,
            })
        })
        .collect::<Result<Vec<_>, MetadataError>>()?;

    for token in &rewritten {
        write_document(&token.path, &token.document)?;
        debug!(index = token.index, image = %token.document.image, "token metadata rewritten");
    }

    info!(dir = %dir.display(), tokens = rewritten.len(), "token metadata rewritten");
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const BASE: &str = "https://drops.s3.us-east-2.amazonaws.com/deployment-artifacts/apes/images/tokens";

    fn token_json(name: &str) -> String {
        format!(
            r#"{{"description":"d","external_url":"https://apes.test","image":"ipfs://placeholder","name":"{name}","attributes":[{{"trait_type":"Fur","value":"Gold"}}]}}"#
        )
    }

    fn token_dir(count: u64) -> TempDir {
        let dir = TempDir::new().unwrap();
        for i in 1..=count {
            fs::write(dir.path().join(format!("{i}.json")), token_json(&format!("Ape #{i}")))
                .unwrap();
        }
        dir
    }

    fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let p = e.unwrap().path();
                let bytes = fs::read(&p).unwrap();
                (p, bytes)
            })
            .collect();
        files.sort();
        files
    }

    #[test]
    fn contract_rewrite_sets_four_fields() {
        let original = ContractMetadata {
            name: "old".into(),
            description: "A collection".into(),
            image: "ipfs://old".into(),
            external_link: "https://apes.test".into(),
            collaborators: vec!["0x0000000000000000000000000000000000000000".into()],
            ..ContractMetadata::default()
        };

        let doc = rewrite_contract_metadata(original.clone(), "Cool Apes", "https://cdn.test/contract/");

        assert_eq!(doc.name, "Cool Apes");
        assert_eq!(doc.image, "https://cdn.test/contract/image.jpeg");
        assert_eq!(doc.banner_image, "https://cdn.test/contract/banner_image.jpeg");
        assert_eq!(doc.featured_image, "https://cdn.test/contract/featured_image.jpeg");
        assert_eq!(doc.description, original.description);
        assert_eq!(doc.external_link, original.external_link);
        assert_eq!(doc.collaborators, original.collaborators);
    }

    #[test]
    fn contract_rewrite_drops_repeated_collaborators() {
        let original = ContractMetadata {
            collaborators: vec![
                "0xAbC0000000000000000000000000000000000001".into(),
                "0x0000000000000000000000000000000000000002".into(),
                "0xabc0000000000000000000000000000000000001".into(),
                "0x0000000000000000000000000000000000000002".into(),
            ],
            ..ContractMetadata::default()
        };

        let doc = rewrite_contract_metadata(original, "Apes", "https://cdn.test/contract");

        assert_eq!(
            doc.collaborators,
            vec![
                "0xAbC0000000000000000000000000000000000001",
                "0x0000000000000000000000000000000000000002",
            ]
        );
    }

    #[test]
    fn contract_file_rewrite_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.json");
        fs::write(
            &path,
            r#"{"name":"x","description":"d","image":"","banner_image":"","featured_image":"","external_link":"","collaborators":[],"seller_fee_basis_points":500}"#,
        )
        .unwrap();

        let first = rewrite_contract_metadata_file(&path, "Apes", "https://cdn.test/c").unwrap();
        let bytes_first = fs::read(&path).unwrap();
        let second = rewrite_contract_metadata_file(&path, "Apes", "https://cdn.test/c").unwrap();
        let bytes_second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(bytes_first, bytes_second);
        assert_eq!(second.extra["seller_fee_basis_points"], 500);
    }

    #[test]
    fn batch_rewrites_every_token() {
        let dir = token_dir(3);
        let rewritten = rewrite_token_metadata_batch(dir.path(), BASE).unwrap();

        assert_eq!(rewritten.len(), 3);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
        for i in 1..=3u64 {
            let doc: TokenMetadata = read_document(&dir.path().join(format!("{i}.json"))).unwrap();
            assert_eq!(doc.image, format!("{BASE}/{i}.jpeg"));
            assert_eq!(doc.name, format!("Ape #{i}"));
            assert_eq!(doc.attributes[0].trait_type, "Fur");
        }
    }

    #[test]
    fn batch_rewrite_is_idempotent() {
        let dir = token_dir(4);
        let first = rewrite_token_metadata_batch(dir.path(), BASE).unwrap();
        let after_first = snapshot(dir.path());
        let second = rewrite_token_metadata_batch(dir.path(), BASE).unwrap();

        assert_eq!(first, second);
        assert_eq!(after_first, snapshot(dir.path()));
    }

    #[test]
    fn gap_writes_nothing() {
        let dir = TempDir::new().unwrap();
        for i in [1, 2, 4] {
            fs::write(dir.path().join(format!("{i}.json")), token_json("Ape")).unwrap();
        }
        let before = snapshot(dir.path());

        let err = rewrite_token_metadata_batch(dir.path(), BASE).unwrap_err();

        assert!(matches!(err, MetadataError::NonContiguousTokenIndices { .. }));
        assert_eq!(before, snapshot(dir.path()));
    }

    #[test]
    fn unparsable_document_writes_nothing() {
        let dir = token_dir(3);
        fs::write(dir.path().join("3.json"), b"{ broken").unwrap();
        let before = snapshot(dir.path());

        let err = rewrite_token_metadata_batch(dir.path(), BASE).unwrap_err();

        assert!(matches!(err, MetadataError::Json { .. }));
        assert_eq!(before, snapshot(dir.path()));
    }
}
