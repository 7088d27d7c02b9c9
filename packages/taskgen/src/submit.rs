use std::time::Duration;

use common::config::ApiConfig;
use common::{TaskRecord, TaskSubmission};
use serde_json::Value;
use tracing::{info, warn};

use crate::draft::{TaskDraft, TaskId};
use crate::package::Sidecars;
use crate::rubric::RubricItem;
use crate::templates::Artifacts;

const FALLBACK_DETAIL: &str = "Failed to save to database";

/// Result of mirroring a package to the collector. Never affects the archive.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Saved(TaskRecord),
    /// Submission is disabled by configuration.
    Skipped,
    Failed(String),
}

impl SubmissionOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    pub fn status_line(&self) -> String {
        match self {
            Self::Saved(_) => "Successfully saved to database".to_string(),
            Self::Skipped => "Database save skipped (API disabled)".to_string(),
            Self::Failed(detail) => format!("Database save failed: {detail}"),
        }
    }
}

/// Request body for `POST /api/tasks`.
pub fn build_submission(
    task_id: &TaskId,
    draft: &TaskDraft,
    items: &[RubricItem],
    artifacts: &Artifacts,
    sidecars: &Sidecars,
) -> TaskSubmission {
    TaskSubmission {
        task_id: task_id.to_string(),
        task_name: draft.task_name().to_string(),
        sector: draft.sector.trim().to_string(),
        occupation: draft.occupation.trim().to_string(),
        instruction: draft.instruction_text().to_string(),
        difficulty: draft.difficulty.to_string(),
        expert_time_min: draft.expert_minutes(),
        junior_time_min: draft.junior_minutes(),
        rubrics: items.iter().map(RubricItem::to_entry).collect(),
        solution_files: sidecars.solution.clone(),
        data_files: sidecars.reference.clone(),
        task_yaml: artifacts.task_yaml.clone(),
        solution_sh: artifacts.solution_sh.clone(),
    }
}

/// HTTP client for the task collector.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
}

impl SubmissionClient {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            enabled: config.enabled,
        })
    }

    /// A client whose every submission is [`SubmissionOutcome::Skipped`].
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: String::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn submit(&self, payload: &TaskSubmission) -> SubmissionOutcome {
        if !self.enabled {
            info!(task_id = %payload.task_id, "Submission disabled, skipping");
            return SubmissionOutcome::Skipped;
        }

        match self.post(payload).await {
            Ok(record) => {
                info!(task_id = %record.task_id, id = %record.id, "Task saved to collector");
                SubmissionOutcome::Saved(record)
            }
            Err(detail) => {
                warn!(task_id = %payload.task_id, error = %detail, "Task submission failed");
                SubmissionOutcome::Failed(detail)
            }
        }
    }

    async fn post(&self, payload: &TaskSubmission) -> Result<TaskRecord, String> {
        let url = format!("{}/api/tasks", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            return Err(error_detail(body.as_ref()));
        }

        response
            .json::<TaskRecord>()
            .await
            .map_err(|e| e.to_string())
    }
}

/// The `detail` member of an error body, or the generic message.
fn error_detail(body: Option<&Value>) -> String {
    match body.and_then(|b| b.get("detail")) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null | Value::String(_)) | None => FALLBACK_DETAIL.to_string(),
        Some(other) => other.to_string(),
    }
}
