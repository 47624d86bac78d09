pub mod reader;
pub mod writer;

pub use reader::FileReader;
pub use writer::{is_valid_document_id, output_path, write_document};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

/// A loaded source text, ready for event extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub document_id: String,
    pub path: String,
    pub text: String,
}

/// Generate a stable document ID from file path
pub fn generate_doc_id(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Collapse every run of whitespace to a single space and trim the ends.
pub fn preprocess(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Load one file. `document_id` defaults to a hash of the path.
pub async fn load_file(file_path: &Path, document_id: Option<String>) -> Result<SourceDocument> {
    let content = FileReader::read_file(file_path).await?;
    let path = file_path.to_string_lossy().to_string();
    let document_id = document_id.unwrap_or_else(|| generate_doc_id(&path));

    info!(document_id = %document_id, path = %path, bytes = content.len(), "Loaded document");

    Ok(SourceDocument {
        document_id,
        path,
        text: preprocess(&content),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_collapses_whitespace() {
        assert_eq!(preprocess("  Alice\tmet\n\nBob   today. "), "Alice met Bob today.");
        assert_eq!(preprocess(" \n "), "");
    }

    #[test]
    fn test_doc_id_is_stable() {
        let a = generate_doc_id("docs/a.txt");
        assert_eq!(a, generate_doc_id("docs/a.txt"));
        assert_ne!(a, generate_doc_id("docs/b.txt"));
        assert_eq!(a.len(), 32);
    }

    #[tokio::test]
    async fn test_load_file_uses_given_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.txt");
        std::fs::write(&path, "Alice  met\nBob.").unwrap();

        let doc = load_file(&path, Some("story".into())).await.unwrap();
        assert_eq!(doc.document_id, "story");
        assert_eq!(doc.text, "Alice met Bob.");

        let doc = load_file(&path, None).await.unwrap();
        assert_eq!(doc.document_id, generate_doc_id(&doc.path));
    }
}
