//! Temporary file cleanup.
//!
//! Cleanup never fails a request: problems are logged as warnings and the
//! caller carries on.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;
use tracing::{debug, info, warn};

/// Remove one temporary file. A file that is already gone is not an error.
pub async fn remove_temp_file(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed temp file {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Cleanup warning: failed to remove {}: {}", path.display(), e),
    }
}

/// Create `dir` if needed and delete regular files left behind by a previous run.
///
/// Returns the number of files removed.
pub async fn prepare_scratch_dir(dir: &Path) -> std::io::Result<usize> {
    fs::create_dir_all(dir).await?;

    let mut entries = fs::read_dir(dir).await?;
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let is_file = match entry.file_type().await {
            Ok(file_type) => file_type.is_file(),
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        if is_file {
            remove_temp_file(&entry.path()).await;
            removed += 1;
        }
    }

    if removed > 0 {
        info!("Removed {} stale files from {}", removed, dir.display());
    }

    Ok(removed)
}
