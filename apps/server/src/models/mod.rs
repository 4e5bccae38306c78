//! Domain models for the model conversion service.

pub mod access_url;
pub mod conversion;
pub mod upload;

// Re-export commonly used types
pub use access_url::{AccessUrl, RouteKind};
pub use conversion::{ConvertForm, ConvertResponse};
pub use upload::{ConvertedArtifact, UploadedFile};
