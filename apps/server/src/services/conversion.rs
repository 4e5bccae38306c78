//! Conversion gateway.
//!
//! Runs the external conversion tool on one uploaded model, hands the result
//! to the file repository and always removes both local files afterwards.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::fs;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::ConverterSettings;
use crate::error::{AppError, AppResult};
use crate::models::{AccessUrl, ConvertedArtifact, UploadedFile};
use crate::services::cleanup::remove_temp_file;
use crate::services::storage::{FileStore, is_valid_key_segment};

/// Converts uploads with the configured tool and stores the output.
#[derive(Clone)]
pub struct ConversionGateway {
    converter: ConverterSettings,
    output_dir: PathBuf,
    repository: Arc<dyn FileStore>,
}

impl ConversionGateway {
    pub fn new(
        converter: ConverterSettings,
        output_dir: impl Into<PathBuf>,
        repository: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            converter,
            output_dir: output_dir.into(),
            repository,
        }
    }

    /// Convert `upload`, store the result under `models` and return its URL.
    ///
    /// `desired_name` becomes the base name verbatim; when absent the upload's
    /// original filename without extension is used. The upload and the
    /// converted file are removed before returning, whatever the outcome.
    pub async fn convert(
        &self,
        upload: UploadedFile,
        desired_name: Option<&str>,
    ) -> AppResult<AccessUrl> {
        let base_name = match resolve_base_name(&upload, desired_name) {
            Ok(name) => name,
            Err(e) => {
                remove_temp_file(&upload.path).await;
                return Err(e);
            }
        };

        let artifact = ConvertedArtifact::new(
            &self.output_dir,
            &base_name,
            &self.converter.target_extension,
        );

        info!(
            "Converting {} to {}...",
            upload.path.display(),
            artifact.path.display()
        );

        let result = self.convert_and_store(&upload, &artifact).await;

        remove_temp_file(&upload.path).await;
        remove_temp_file(&artifact.path).await;

        result
    }

    async fn convert_and_store(
        &self,
        upload: &UploadedFile,
        artifact: &ConvertedArtifact,
    ) -> AppResult<AccessUrl> {
        self.run_converter(&upload.path, &artifact.path).await?;

        info!(
            "Uploading {} to {}/{}...",
            artifact.path.display(),
            artifact.subfolder,
            artifact.filename
        );

        self.repository
            .store(&artifact.path, artifact.subfolder, &artifact.filename)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to upload converted model to storage: {}",
                    e
                ))
            })
    }

    /// Invoke the tool as `program args... <input> <output>` and wait for it.
    ///
    /// Succeeds only if the tool exits cleanly and `output` exists afterwards.
    pub async fn run_converter(&self, input: &Path, output: &Path) -> AppResult<()> {
        let result = Command::new(&self.converter.program)
            .args(&self.converter.args)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                AppError::Conversion(format!(
                    "Conversion failed: could not run {}: {}",
                    self.converter.program, e
                ))
            })?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        let stderr = stderr.trim();

        if !result.status.success() {
            error!("Converter stderr: {}", stderr);
            return Err(AppError::Conversion(if stderr.is_empty() {
                format!("Conversion failed: converter exited with {}", result.status)
            } else {
                format!("Conversion failed: {}", stderr)
            }));
        }

        debug!(
            "Converter stdout: {}",
            String::from_utf8_lossy(&result.stdout).trim()
        );

        match fs::try_exists(output).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::Conversion(
                "Converted file was not created by the conversion tool".to_string(),
            )),
            Err(e) => Err(AppError::Conversion(format!(
                "Could not check converted file {}: {}",
                output.display(),
                e
            ))),
        }
    }
}

/// Pick the artifact base name: the caller's name verbatim, else the upload's stem.
pub fn resolve_base_name(upload: &UploadedFile, desired_name: Option<&str>) -> AppResult<String> {
    let base_name = match desired_name.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => upload.default_base_name().ok_or_else(|| {
            AppError::InvalidInput("Could not derive a name for the converted model".to_string())
        })?,
    };

    if !is_valid_key_segment(&base_name) {
        return Err(AppError::InvalidInput(format!(
            "Invalid filename: {}",
            base_name
        )));
    }

    Ok(base_name)
}
