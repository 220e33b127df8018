//! Collection metadata documents and their URL rewriting.
//!
//! Contract-level metadata describes the collection; token-level metadata
//! lives in one `{index}.json` file per token, indices contiguous from 1.
//! The rewriter points every `image` field at the published location and
//! persists the documents in place.

pub mod document;
pub mod error;
pub mod rewrite;
pub mod tokens;

pub use document::{
    ContractMetadata, TokenAttribute, TokenMetadata, read_document, write_document,
};
pub use error::MetadataError;
pub use rewrite::{
    BANNER_IMAGE_FILE, CONTRACT_IMAGE_FILE, FEATURED_IMAGE_FILE, RewrittenToken, image_url,
    rewrite_contract_metadata, rewrite_contract_metadata_file, rewrite_token_metadata,
    rewrite_token_metadata_batch, token_image_file,
};
pub use tokens::{TokenFile, scan_token_indices};
