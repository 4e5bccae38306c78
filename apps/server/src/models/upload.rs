//! Per-request file entities.

use std::path::{Path, PathBuf};

use crate::services::storage::MODELS_SUBFOLDER;

/// One request's uploaded model, spooled to the temporary upload directory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Unique temp path (`<upload_dir>/<uuid>.<ext>`)
    pub path: PathBuf,
    /// Filename as sent by the client, if any
    pub original_name: Option<String>,
    /// Declared content type, if any
    pub content_type: Option<String>,
}

impl UploadedFile {
    /// Stem used when the caller does not supply a name.
    ///
    /// Prefers the client's filename without directories or extension and
    /// falls back to the temp file's own stem.
    pub fn default_base_name(&self) -> Option<String> {
        self.original_name
            .as_deref()
            .map(|name| name.replace('\\', "/"))
            .and_then(|name| {
                Path::new(&name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(String::from)
            })
            .filter(|stem| !stem.is_empty())
            .or_else(|| {
                self.path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(String::from)
            })
    }
}

/// File produced by the conversion tool, awaiting upload to the repository.
#[derive(Debug, Clone)]
pub struct ConvertedArtifact {
    /// Local output path
    pub path: PathBuf,
    /// Repository subfolder the artifact is stored under
    pub subfolder: &'static str,
    /// `<base_name>.<target_extension>`
    pub filename: String,
}

impl ConvertedArtifact {
    pub fn new(output_dir: &Path, base_name: &str, extension: &str) -> Self {
        let filename = format!("{}.{}", base_name, extension);
        Self {
            path: output_dir.join(&filename),
            subfolder: MODELS_SUBFOLDER,
            filename,
        }
    }
}
