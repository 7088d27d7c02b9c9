pub mod attachment;
pub mod draft;
pub mod error;
pub mod judge;
pub mod metadata;
pub mod notice;
pub mod package;
pub mod pipeline;
pub mod rubric;
pub mod submit;
pub mod taxonomy;
pub mod templates;

pub use attachment::{Attachment, AttachmentKind, AttachmentSet, FileCategory};
pub use draft::{Difficulty, TaskDraft, TaskId};
pub use error::{DraftError, PackageError, ValidationError};
pub use notice::{Notice, NoticeLevel};
pub use pipeline::{GenerateReport, Pipeline, PipelineError, PipelineState, Preview, Session};
pub use rubric::{RubricItem, RubricModel};
pub use submit::{SubmissionClient, SubmissionOutcome};
