use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-file metadata recorded in `metadata.json` side-cars and in the
/// submission payload.
///
/// Media fields are only present when the file was recognized and decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FileMetadata {
    #[schema(example = "answer.txt")]
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Lower-cased extension without the dot.
    #[schema(example = "txt")]
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// `"<width>x<height>"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "1920x1080")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// `H:MM:SS`, or `M:SS` when under an hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "3:07")]
    pub duration_formatted: Option<String>,
}

impl FileMetadata {
    /// Metadata carrying only the base fields.
    pub fn base(name: impl Into<String>, size: u64, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            extension: extension.into(),
            width: None,
            height: None,
            resolution: None,
            duration_seconds: None,
            duration_formatted: None,
        }
    }

    /// True when no decoder contributed anything beyond name, size and extension.
    pub fn is_base_only(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.resolution.is_none()
            && self.duration_seconds.is_none()
            && self.duration_formatted.is_none()
    }
}

/// A rubric category as submitted to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RubricEntry {
    #[schema(example = "Correctness")]
    pub name: String,
    /// `null` when the author left the description empty.
    pub description: Option<String>,
    #[serde(default = "default_points")]
    #[schema(example = 10)]
    pub points: u32,
}

fn default_points() -> u32 {
    10
}

fn default_difficulty() -> String {
    "medium".into()
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TaskSubmission {
    #[schema(example = "k3x9q2_sample-task")]
    pub task_id: String,
    #[schema(example = "sample-task")]
    pub task_name: String,
    #[schema(example = "Government")]
    pub sector: String,
    #[schema(example = "Compliance Officers")]
    pub occupation: String,
    pub instruction: String,
    #[serde(default = "default_difficulty")]
    #[schema(example = "hard")]
    pub difficulty: String,
    pub expert_time_min: u32,
    pub junior_time_min: u32,
    pub rubrics: Vec<RubricEntry>,
    pub solution_files: Vec<FileMetadata>,
    #[serde(default)]
    pub data_files: Vec<FileMetadata>,
    pub task_yaml: String,
    pub solution_sh: String,
}

/// Summary of a stored task, returned by the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TaskRecord {
    pub id: String,
    pub task_id: String,
    pub task_name: String,
    pub sector: String,
    pub occupation: String,
    #[schema(example = "pending")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}
