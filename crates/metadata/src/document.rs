//! Metadata document types and JSON persistence.
//!
//! Fields the pipeline does not know about are kept in `extra` and written
//! back unchanged.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MetadataError;

/// Contract-level (collection) metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub banner_image: String,
    #[serde(default)]
    pub featured_image: String,
    #[serde(default)]
    pub external_link: String,
    /// Collaborator addresses; repeats are dropped on rewrite.
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-token metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub external_url: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<TokenAttribute>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One trait of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAttribute {
    pub trait_type: String,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads and parses a JSON document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, MetadataError> {
    let content = std::fs::read(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&content).map_err(|source| MetadataError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a document as pretty-printed JSON, replacing the file.
pub fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<(), MetadataError> {
    let mut content = serde_json::to_vec_pretty(document).map_err(|source| MetadataError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    content.push(b'\n');
    std::fs::write(path, content).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_metadata_keeps_unknown_fields() {
        let json = r#"{
            "description": "An ape",
            "external_url": "https://apes.test/1",
            "image": "ipfs://old",
            "name": "Ape #1",
            "attributes": [
                {"trait_type": "Fur", "value": "Gold"},
                {"trait_type": "Level", "value": 3, "display_type": "number"}
            ],
            "animation_url": "https://apes.test/1.mp4"
        }"#;

        let doc: TokenMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(doc.attributes.len(), 2);
        assert_eq!(doc.attributes[1].value, Value::from(3));
        assert_eq!(doc.attributes[1].extra["display_type"], "number");
        assert_eq!(doc.extra["animation_url"], "https://apes.test/1.mp4");

        let back: Value = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["animation_url"], "https://apes.test/1.mp4");
        assert_eq!(back["attributes"][1]["display_type"], "number");
    }

    #[test]
    fn contract_metadata_defaults_missing_fields() {
        let doc: ContractMetadata = serde_json::from_str(r#"{"name": "Apes"}"#).unwrap();
        assert_eq!(doc.name, "Apes");
        assert!(doc.image.is_empty());
        assert!(doc.collaborators.is_empty());
    }

    #[test]
    fn read_reports_path_on_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = read_document::<ContractMetadata>(&path).unwrap_err();
        assert!(matches!(err, MetadataError::Json { .. }));
        assert!(err.to_string().contains("metadata.json"));
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.json");
        let doc = TokenMetadata {
            name: "Ape #1".into(),
            ..TokenMetadata::default()
        };

        write_document(&path, &doc).unwrap();
        let loaded: TokenMetadata = read_document(&path).unwrap();
        assert_eq!(loaded, doc);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }
}
