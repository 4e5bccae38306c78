//! Business logic services.

pub mod cleanup;
pub mod conversion;
pub mod storage;

pub use cleanup::{prepare_scratch_dir, remove_temp_file};
pub use conversion::ConversionGateway;
pub use storage::{FileRepository, FileStore, LocalBucket, StoredObject};
