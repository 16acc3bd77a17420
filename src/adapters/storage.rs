use crate::domain::ports::Storage;
use crate::utils::error::{Result, ThoughtError};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);
        let written = full_path.display().to_string();

        let to_write_error = |source| ThoughtError::ExportWriteError {
            path: written.clone(),
            source,
        };

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(to_write_error)?;
        }

        fs::write(&full_path, data).map_err(to_write_error)?;
        tracing::debug!("Wrote {} bytes to {}", data.len(), written);
        Ok(written)
    }
}
