pub mod config;
pub mod filename;
pub mod payload;
pub mod retry;

pub use payload::{FileMetadata, RubricEntry, TaskRecord, TaskSubmission};
