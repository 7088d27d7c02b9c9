use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use common::{TaskRecord, TaskSubmission};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::models::task::TaskListQuery;

pub const INITIAL_STATUS: &str = "pending";

#[derive(Debug, Clone)]
pub struct StoredTask {
    pub record: TaskRecord,
    pub submission: TaskSubmission,
    /// Insertion order, breaks `created_at` ties.
    seq: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Task with this ID already exists")]
    Duplicate,
}

/// In-memory task store keyed by `task_id`.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: DashMap<String, StoredTask>,
    next_seq: AtomicU64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn insert(&self, submission: TaskSubmission) -> Result<TaskRecord, StoreError> {
        match self.tasks.entry(submission.task_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let record = TaskRecord {
                    id: Uuid::now_v7().to_string(),
                    task_id: submission.task_id.clone(),
                    task_name: submission.task_name.clone(),
                    sector: submission.sector.clone(),
                    occupation: submission.occupation.clone(),
                    status: INITIAL_STATUS.into(),
                    created_at: Utc::now(),
                };
                slot.insert(StoredTask {
                    record: record.clone(),
                    submission,
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                });
                Ok(record)
            }
        }
    }

    pub fn get(&self, task_id: &str) -> Option<StoredTask> {
        self.tasks.get(task_id).map(|t| t.value().clone())
    }

    /// Newest first, filtered then paged.
    pub fn list(&self, query: &TaskListQuery) -> Vec<TaskRecord> {
        let mut matching: Vec<(u64, TaskRecord)> = self
            .tasks
            .iter()
            .filter(|t| {
                let r = &t.record;
                query.sector.as_deref().is_none_or(|s| r.sector == s)
                    && query.occupation.as_deref().is_none_or(|o| r.occupation == o)
                    && query.status.as_deref().is_none_or(|s| r.status == s)
            })
            .map(|t| (t.seq, t.record.clone()))
            .collect();

        matching.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });

        matching
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .map(|(_, record)| record)
            .collect()
    }
}
