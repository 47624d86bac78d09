use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Whether `document_id` can name an output file without leaving the output
/// directory.
pub fn is_valid_document_id(document_id: &str) -> bool {
    !document_id.trim().is_empty()
        && !document_id.contains("..")
        && !document_id.contains(['/', '\\', '\0'])
}

/// `{dir}/{document_id}_events.json`
pub fn output_path(dir: &Path, document_id: &str) -> PathBuf {
    dir.join(format!("{}_events.json", document_id))
}

/// Write a document as pretty-printed JSON, creating `dir` if needed.
pub async fn write_document<T: Serialize>(dir: &Path, document_id: &str, document: &T) -> Result<PathBuf> {
    if !is_valid_document_id(document_id) {
        anyhow::bail!("Invalid document id for output file: {:?}", document_id);
    }

    fs::create_dir_all(dir)
        .await
        .context(format!("Failed to create output directory: {:?}", dir))?;

    let path = output_path(dir, document_id);
    let json = serde_json::to_string_pretty(document).context("Failed to serialize document")?;
    fs::write(&path, json)
        .await
        .context(format!("Failed to write file: {:?}", path))?;

    info!(path = ?path, "Wrote event document");
    Ok(path)
}
