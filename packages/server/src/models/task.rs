use common::TaskSubmission;
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

/// Filters for `GET /api/tasks`. Filters are exact matches.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    /// Only tasks from this sector.
    pub sector: Option<String>,
    /// Only tasks for this occupation.
    pub occupation: Option<String>,
    /// Only tasks in this review status.
    pub status: Option<String>,
    /// Page size (default 50, max 500).
    pub limit: Option<usize>,
    /// Number of records to skip (default 0).
    pub offset: Option<usize>,
}

impl TaskListQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn validate_submission(req: &TaskSubmission) -> Result<(), AppError> {
    require(&req.task_id, "task_id")?;
    require(&req.task_name, "task_name")?;
    require(&req.sector, "sector")?;
    require(&req.occupation, "occupation")?;
    require(&req.instruction, "instruction")?;
    require(&req.task_yaml, "task_yaml")?;
    require(&req.solution_sh, "solution_sh")?;
    if req.rubrics.is_empty() {
        return Err(AppError::Validation("rubrics must not be empty".into()));
    }
    if let Some(entry) = req.rubrics.iter().find(|r| r.name.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "rubric name must not be empty (points: {})",
            entry.points
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use common::{FileMetadata, RubricEntry};

    use super::*;

    pub(crate) fn submission(task_id: &str) -> TaskSubmission {
        TaskSubmission {
            task_id: task_id.into(),
            task_name: "sample-task".into(),
            sector: "Government".into(),
            occupation: "Compliance Officers".into(),
            instruction: "List every compliance gap.".into(),
            difficulty: "hard".into(),
            expert_time_min: 120,
            junior_time_min: 330,
            rubrics: vec![RubricEntry {
                name: "Accuracy".into(),
                description: None,
                points: 10,
            }],
            solution_files: vec![FileMetadata::base("answer.txt", 4, "txt")],
            data_files: vec![],
            task_yaml: "instruction: |-\n  x\n".into(),
            solution_sh: "#!/bin/bash\nexit 0\n".into(),
        }
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(validate_submission(&submission("a_b")).is_ok());

        let mut req = submission("a_b");
        req.sector = "  ".into();
        let err = validate_submission(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "sector must not be empty"));

        let mut req = submission("a_b");
        req.rubrics.clear();
        assert!(validate_submission(&req).is_err());
    }

    #[test]
    fn limit_is_clamped() {
        let query = TaskListQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_LIMIT);
        assert_eq!(TaskListQuery::default().limit(), DEFAULT_LIMIT);
        assert_eq!(TaskListQuery::default().offset(), 0);
    }
}
