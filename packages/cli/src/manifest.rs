//! On-disk task manifest (`task.toml`) that the CLI turns into a [`Session`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use taskgen::{
    Attachment, AttachmentKind, Difficulty, RubricItem, RubricModel, Session, TaskDraft, TaskId,
};

pub const DEFAULT_MANIFEST: &str = "task.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    i64::from(taskgen::rubric::DEFAULT_POINTS)
}

/// Attachment paths are relative to the manifest's directory unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskManifest {
    pub name: String,
    pub sector: String,
    pub occupation: String,
    pub instruction: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub expert_hours: f64,
    pub junior_hours: f64,
    #[serde(default)]
    pub reference_files: Vec<PathBuf>,
    #[serde(default)]
    pub solution_files: Vec<PathBuf>,
    #[serde(default)]
    pub rubric: Vec<RubricSpec>,
    /// Id issued by the last preview; generate reuses it, then clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// A parsed manifest together with the directory its paths resolve against.
pub struct LoadedManifest {
    pub manifest: TaskManifest,
    pub path: PathBuf,
    pub base_dir: PathBuf,
}

impl TaskManifest {
    pub fn load(path: &Path) -> Result<LoadedManifest> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest: TaskManifest = toml::from_str(&text)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(LoadedManifest {
            manifest,
            path: path.to_path_buf(),
            base_dir,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).context("Failed to serialize manifest")?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write manifest {}", path.display()))
    }

    pub fn to_draft(&self) -> TaskDraft {
        let mut draft = TaskDraft::new();
        draft.task_name = self.name.clone();
        draft.sector = self.sector.clone();
        draft.occupation = self.occupation.clone();
        draft.instruction = self.instruction.clone();
        draft.difficulty = self.difficulty;
        draft.expert_hours = self.expert_hours;
        draft.junior_hours = self.junior_hours;
        draft.rubric = RubricModel::from_items(
            self.rubric
                .iter()
                .map(|r| RubricItem::new(&r.name, &r.description, r.points)),
        );
        draft
    }
}

impl LoadedManifest {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Build a session, attaching every listed file. Duplicate names become
    /// notices on the session rather than errors. A stored task id is reused
    /// while it still matches the task name.
    pub async fn to_session(&self) -> Result<Session> {
        let mut session = Session::new(self.manifest.to_draft());
        if let Some(raw) = &self.manifest.task_id {
            session.resume_task_id(raw);
        }
        let lists = [
            (AttachmentKind::Reference, &self.manifest.reference_files),
            (AttachmentKind::Solution, &self.manifest.solution_files),
        ];
        for (kind, paths) in lists {
            for path in paths {
                let resolved = self.resolve(path);
                let attachment = Attachment::from_path(&resolved)
                    .await
                    .with_context(|| format!("Cannot attach {}", resolved.display()))?;
                session.attach(kind, attachment);
            }
        }
        Ok(session)
    }

    /// Store (or clear) the task id in the manifest file. No write when
    /// nothing changed.
    pub fn remember_task_id(&mut self, id: Option<&TaskId>) -> Result<()> {
        let id = id.map(|id| id.as_str().to_string());
        if self.manifest.task_id == id {
            return Ok(());
        }
        self.manifest.task_id = id;
        self.manifest.save(&self.path)
    }
}
