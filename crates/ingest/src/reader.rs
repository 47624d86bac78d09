use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

pub struct FileReader;

impl FileReader {
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
    }

    pub async fn read_file(path: &Path) -> Result<String> {
        if !Self::is_supported(path) {
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            anyhow::bail!("Unsupported file format: {}", extension);
        }

        fs::read_to_string(path)
            .await
            .context(format!("Failed to read file: {:?}", path))
    }
}
