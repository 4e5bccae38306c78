//! Local file repository for converted models and images.
//!
//! Files are keyed by `(subfolder, filename)`. The `models` subfolder lives
//! flat in the models root; every other subfolder becomes a directory under
//! the images root. Writes overwrite, there is no versioning, and access URLs
//! are derived from the key rather than stored.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::config::StorageSettings;
use crate::error::{AppError, AppResult};
use crate::models::{AccessUrl, RouteKind};

/// Subfolder routed to the models root.
pub const MODELS_SUBFOLDER: &str = "models";

/// An open stored file plus the metadata needed to serve it.
#[derive(Debug)]
pub struct StoredObject {
    /// Readable byte stream
    pub body: fs::File,
    /// Content type guessed from the filename extension
    pub content_type: String,
    /// Size in bytes from the filesystem
    pub content_length: u64,
}

/// Storage capability shared by every repository instance.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Copy `local_path` into the repository, overwriting any existing file.
    ///
    /// Failures are logged here; callers only see a storage error.
    async fn store(&self, local_path: &Path, subfolder: &str, filename: &str)
    -> AppResult<AccessUrl>;

    /// Open a stored file. Returns `None` when absent or unreadable.
    async fn retrieve(&self, subfolder: &str, filename: &str) -> Option<StoredObject>;

    /// Remove a stored file. A file that is already gone counts as deleted.
    async fn delete(&self, subfolder: &str, filename: &str) -> AppResult<bool>;

    /// Replace a stored file. Same as [`FileStore::store`].
    async fn update(
        &self,
        local_path: &Path,
        subfolder: &str,
        filename: &str,
    ) -> AppResult<AccessUrl> {
        self.store(local_path, subfolder, filename).await
    }

    /// Public URL for a key. Pure, no I/O.
    fn url_for(&self, subfolder: &str, filename: &str) -> AccessUrl;
}

/// How a bucket maps subfolders onto its root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketLayout {
    /// Every key lives directly in the root
    Flat,
    /// Each subfolder is a directory under the root
    PerSubfolder,
}

/// One configured storage root.
#[derive(Debug, Clone)]
pub struct LocalBucket {
    root: PathBuf,
    route: RouteKind,
    layout: BucketLayout,
    public_host: String,
}

impl LocalBucket {
    pub fn new(
        root: impl Into<PathBuf>,
        route: RouteKind,
        layout: BucketLayout,
        public_host: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            route,
            layout,
            public_host: public_host.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn route(&self) -> RouteKind {
        self.route
    }

    /// Directory holding files of `subfolder`.
    pub fn dir_for(&self, subfolder: &str) -> PathBuf {
        match self.layout {
            BucketLayout::Flat => self.root.clone(),
            BucketLayout::PerSubfolder => self.root.join(subfolder),
        }
    }

    /// Physical path of a key, rejecting keys that could escape the root.
    pub fn path_for(&self, subfolder: &str, filename: &str) -> AppResult<PathBuf> {
        if !is_valid_key_segment(subfolder) {
            return Err(AppError::Storage(format!("Invalid subfolder: {:?}", subfolder)));
        }
        if !is_valid_key_segment(filename) {
            return Err(AppError::Storage(format!("Invalid filename: {:?}", filename)));
        }
        Ok(self.dir_for(subfolder).join(filename))
    }

    async fn copy_into(
        &self,
        local_path: &Path,
        subfolder: &str,
        filename: &str,
    ) -> AppResult<PathBuf> {
        let destination = self.path_for(subfolder, filename)?;
        let destination_dir = self.dir_for(subfolder);

        fs::create_dir_all(&destination_dir).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create directory {}: {}",
                destination_dir.display(),
                e
            ))
        })?;

        fs::copy(local_path, &destination).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                destination.display(),
                e
            ))
        })?;

        Ok(destination)
    }
}

#[async_trait]
impl FileStore for LocalBucket {
    async fn store(
        &self,
        local_path: &Path,
        subfolder: &str,
        filename: &str,
    ) -> AppResult<AccessUrl> {
        let destination = self
            .copy_into(local_path, subfolder, filename)
            .await
            .inspect_err(|e| error!("Upload failed: {}", e))?;

        info!("Stored {}/{} at {}", subfolder, filename, destination.display());
        Ok(self.url_for(subfolder, filename))
    }

    async fn retrieve(&self, subfolder: &str, filename: &str) -> Option<StoredObject> {
        let path = match self.path_for(subfolder, filename) {
            Ok(path) => path,
            Err(e) => {
                warn!("Rejected retrieval: {}", e);
                return None;
            }
        };

        debug!("Getting file: {}", path.display());

        let body = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("File not found: {}", path.display());
                return None;
            }
            Err(e) => {
                error!("Error opening {}: {}", path.display(), e);
                return None;
            }
        };

        let metadata = match body.metadata().await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                warn!("Not a regular file: {}", path.display());
                return None;
            }
            Err(e) => {
                error!("Error reading metadata for {}: {}", path.display(), e);
                return None;
            }
        };

        Some(StoredObject {
            body,
            content_type: content_type_for_filename(filename),
            content_length: metadata.len(),
        })
    }

    async fn delete(&self, subfolder: &str, filename: &str) -> AppResult<bool> {
        let path = self.path_for(subfolder, filename)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("File not found for deletion: {}", path.display());
                Ok(true)
            }
            Err(e) => {
                error!("Delete failed for {}: {}", path.display(), e);
                Err(AppError::Storage(format!("Local file delete failed: {}", e)))
            }
        }
    }

    fn url_for(&self, subfolder: &str, filename: &str) -> AccessUrl {
        AccessUrl::build(&self.public_host, self.route, subfolder, filename)
    }
}

/// Two-root file repository: `models` and everything else.
#[derive(Debug, Clone)]
pub struct FileRepository {
    models: LocalBucket,
    images: LocalBucket,
}

impl FileRepository {
    /// Create the repository from configuration.
    pub fn new(settings: &StorageSettings) -> Self {
        Self {
            models: LocalBucket::new(
                &settings.models_dir,
                RouteKind::Model,
                BucketLayout::Flat,
                &settings.public_host,
            ),
            images: LocalBucket::new(
                &settings.images_dir,
                RouteKind::Image,
                BucketLayout::PerSubfolder,
                &settings.public_host,
            ),
        }
    }

    /// Route segment files of `subfolder` are served under.
    pub fn route_for(subfolder: &str) -> RouteKind {
        if subfolder == MODELS_SUBFOLDER {
            RouteKind::Model
        } else {
            RouteKind::Image
        }
    }

    /// Bucket responsible for `subfolder`.
    pub fn bucket_for(&self, subfolder: &str) -> &LocalBucket {
        match Self::route_for(subfolder) {
            RouteKind::Model => &self.models,
            RouteKind::Image => &self.images,
        }
    }

    /// Ensure both storage roots exist, creating them if necessary.
    pub async fn ensure_roots(&self) -> AppResult<()> {
        for bucket in [&self.models, &self.images] {
            fs::create_dir_all(bucket.root()).await.map_err(|e| {
                AppError::Storage(format!(
                    "Failed to create storage root {}: {}",
                    bucket.root().display(),
                    e
                ))
            })?;
            info!(
                "Storage root ready: {} (/{}/)",
                bucket.root().display(),
                bucket.route()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn store(
        &self,
        local_path: &Path,
        subfolder: &str,
        filename: &str,
    ) -> AppResult<AccessUrl> {
        self.bucket_for(subfolder)
            .store(local_path, subfolder, filename)
            .await
    }

    async fn retrieve(&self, subfolder: &str, filename: &str) -> Option<StoredObject> {
        self.bucket_for(subfolder).retrieve(subfolder, filename).await
    }

    async fn delete(&self, subfolder: &str, filename: &str) -> AppResult<bool> {
        self.bucket_for(subfolder).delete(subfolder, filename).await
    }

    fn url_for(&self, subfolder: &str, filename: &str) -> AccessUrl {
        self.bucket_for(subfolder).url_for(subfolder, filename)
    }
}

/// A key segment must be a single, non-traversing path component.
pub fn is_valid_key_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

/// Content type for a filename, from its last extension.
///
/// The two model formats this service produces are pinned; everything else
/// goes through the MIME registry.
pub fn content_type_for_filename(filename: &str) -> String {
    let path = Path::new(filename);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("glb") => "model/gltf-binary".to_string(),
        Some("usdz") => "model/vnd.usdz+zip".to_string(),
        _ => mime_guess::from_path(path).first_or_octet_stream().to_string(),
    }
}
