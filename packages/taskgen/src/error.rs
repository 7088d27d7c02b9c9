use common::filename::FilenameError;
use thiserror::Error;

/// Rejected edits to a draft. The draft is left unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Minimum 3 rubric categories required")]
    RubricFloor,

    #[error("Rubric category {0} not found")]
    UnknownRubricItem(u32),

    #[error("File already added: {0}")]
    DuplicateAttachment(String),

    #[error("{reason}: {name:?}")]
    InvalidAttachmentName { name: String, reason: FilenameError },

    #[error("File not attached: {0}")]
    UnknownAttachment(String),
}

/// Pre-flight failures. The first failing check is reported and nothing is
/// generated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a task name")]
    MissingTaskName,

    #[error("Task name must be lowercase with hyphens only")]
    InvalidTaskName,

    #[error("Please select a sector")]
    MissingSector,

    #[error("Unknown sector: {0}")]
    UnknownSector(String),

    #[error("Please select an occupation")]
    MissingOccupation,

    #[error("Occupation '{occupation}' does not belong to sector '{sector}'")]
    OccupationNotInSector { occupation: String, sector: String },

    #[error("Task instruction must be at least 50 characters")]
    InstructionTooShort { len: usize },

    #[error("Please upload at least one solution file")]
    MissingSolutionFiles,

    #[error("Please add at least 3 rubric categories")]
    TooFewRubricItems { count: usize },
}

/// Failures while reading attachments or building the archive. These abort
/// the whole generate command.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Failed to read {name}: {source}")]
    ReadAttachment {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Compression task failed: {0}")]
    Join(String),
}
