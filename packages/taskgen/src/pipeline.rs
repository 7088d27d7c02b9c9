//! Session state and the preview/generate command pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use common::config::{ArchiveFormat, JudgeConfig, TaskgenConfig};
use thiserror::Error;
use tracing::{error, info};

use crate::attachment::{Attachment, AttachmentKind};
use crate::draft::{TaskDraft, TaskId};
use crate::error::{DraftError, PackageError, ValidationError};
use crate::metadata::MetadataProber;
use crate::notice::Notice;
use crate::package::{PackageTree, Sidecars};
use crate::rubric::RubricItem;
use crate::submit::{SubmissionClient, SubmissionOutcome, build_submission};
use crate::templates::Artifacts;

const PACKAGE_FAILURE: &str = "Error generating task package";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Validating,
    Generating,
    Submitting,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Generating => "generating",
            Self::Submitting => "submitting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether a new command may start from this state.
    pub fn accepts_commands(&self) -> bool {
        matches!(self, Self::Idle | Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("A command is already running ({0})")]
    Busy(PipelineState),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Error generating task package: {0}")]
    Package(#[from] PackageError),
}

/// One author's working state: the draft, the cached task id and pending
/// notices.
#[derive(Debug, Default)]
pub struct Session {
    pub draft: TaskDraft,
    task_id: Option<TaskId>,
    notices: Vec<Notice>,
}

impl Session {
    pub fn new(draft: TaskDraft) -> Self {
        Self {
            draft,
            task_id: None,
            notices: Vec::new(),
        }
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    /// The cached id, generated on first use so preview and download agree.
    pub fn get_or_create_task_id(&mut self) -> TaskId {
        let slug = self.draft.id_slug();
        self.task_id
            .get_or_insert_with(|| TaskId::generate(&slug))
            .clone()
    }

    /// Reuse an id issued earlier (e.g. by a preview in another process).
    /// Ignored when it no longer matches the draft's task name.
    pub fn resume_task_id(&mut self, raw: &str) -> Option<TaskId> {
        let id = TaskId::parse(raw, &self.draft.id_slug())?;
        self.task_id = Some(id.clone());
        Some(id)
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Add a file; duplicates and bad names are reported as notices.
    pub fn attach(&mut self, kind: AttachmentKind, attachment: Attachment) -> bool {
        match self.draft.attachments_mut(kind).add(attachment) {
            Ok(()) => true,
            Err(e @ DraftError::DuplicateAttachment(_)) => {
                self.notify(Notice::info(e.to_string()));
                false
            }
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                false
            }
        }
    }

    pub fn detach(&mut self, kind: AttachmentKind, name: &str) -> bool {
        self.draft.attachments_mut(kind).remove(name).is_ok()
    }

    pub fn add_rubric_item(&mut self) -> u32 {
        self.draft.rubric.add_item()
    }

    pub fn update_rubric_item(&mut self, id: u32, item: RubricItem) -> bool {
        match self.draft.rubric.update(id, item) {
            Ok(()) => true,
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                false
            }
        }
    }

    /// Remove a category; refusals at the floor become an error notice.
    pub fn remove_rubric_item(&mut self, id: u32) -> bool {
        match self.draft.rubric.remove_item(id) {
            Ok(_) => true,
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                false
            }
        }
    }

    fn reset(&mut self) {
        self.draft = TaskDraft::new();
        self.task_id = None;
    }
}

/// What `request_preview` shows: the id, the tree and the rendered texts.
#[derive(Debug, Clone)]
pub struct Preview {
    pub task_id: TaskId,
    pub tree: PackageTree,
    pub artifacts: Artifacts,
}

impl Preview {
    pub fn task_yaml(&self) -> &str {
        &self.artifacts.task_yaml
    }

    pub fn solution_sh(&self) -> &str {
        &self.artifacts.solution_sh
    }
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub task_id: TaskId,
    pub archive_path: PathBuf,
    pub submission: SubmissionOutcome,
}

struct Assembled {
    items: Vec<RubricItem>,
    artifacts: Artifacts,
    sidecars: Sidecars,
    tree: PackageTree,
}

/// Drives validation, packaging and submission for a session.
///
/// Commands take `&mut self`, so at most one runs at a time.
pub struct Pipeline {
    prober: MetadataProber,
    submitter: SubmissionClient,
    judge: JudgeConfig,
    format: ArchiveFormat,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(
        prober: MetadataProber,
        submitter: SubmissionClient,
        judge: JudgeConfig,
        format: ArchiveFormat,
    ) -> Self {
        Self {
            prober,
            submitter,
            judge,
            format,
            state: PipelineState::Idle,
        }
    }

    pub fn from_config(config: &TaskgenConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            MetadataProber::new(&config.probe),
            SubmissionClient::new(&config.api)?,
            config.judge.clone(),
            config.package.format,
        ))
    }

    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_submitter(mut self, submitter: SubmissionClient) -> Self {
        self.submitter = submitter;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    fn transition(&mut self, next: PipelineState) {
        info!(from = %self.state, to = %next, "Pipeline state change");
        self.state = next;
    }

    fn begin(&self) -> Result<(), PipelineError> {
        if self.state.accepts_commands() {
            Ok(())
        } else {
            Err(PipelineError::Busy(self.state))
        }
    }

    /// Runs the validation gate. A failure returns to `Idle` with a notice.
    fn validate(&mut self, session: &mut Session) -> Result<(), PipelineError> {
        self.transition(PipelineState::Validating);
        if let Err(e) = session.draft.validate() {
            session.notify(Notice::error(e.to_string()));
            self.transition(PipelineState::Idle);
            return Err(e.into());
        }
        Ok(())
    }

    async fn assemble(&self, session: &Session, task_id: &TaskId) -> Result<Assembled, PackageError> {
        let draft = &session.draft;
        let items = draft.rubric.list_items();
        let artifacts = Artifacts::render(draft, &items, &self.judge);

        let (reference, solution) = tokio::join!(
            self.prober.probe_all(draft.reference_files.as_slice()),
            self.prober.probe_all(draft.solution_files.as_slice()),
        );
        let sidecars = Sidecars {
            reference,
            solution,
        };

        let tree = PackageTree::assemble(
            task_id,
            artifacts.clone(),
            &draft.reference_files,
            &draft.solution_files,
            &sidecars,
        )?;
        Ok(Assembled {
            items,
            artifacts,
            sidecars,
            tree,
        })
    }

    fn fail(&mut self, session: &mut Session, err: PackageError) -> PipelineError {
        error!(error = %err, "Task package generation failed");
        session.notify(Notice::error(PACKAGE_FAILURE));
        self.transition(PipelineState::Failed);
        PipelineError::Package(err)
    }

    /// Validate and render the package without writing anything.
    pub async fn request_preview(&mut self, session: &mut Session) -> Result<Preview, PipelineError> {
        self.begin()?;
        self.validate(session)?;

        let task_id = session.get_or_create_task_id();
        self.transition(PipelineState::Generating);
        let assembled = match self.assemble(session, &task_id).await {
            Ok(a) => a,
            Err(e) => return Err(self.fail(session, e)),
        };
        self.transition(PipelineState::Idle);

        Ok(Preview {
            task_id,
            tree: assembled.tree,
            artifacts: assembled.artifacts,
        })
    }

    /// Validate, write `<out_dir>/<task-id>.<ext>`, then mirror the package
    /// to the collector. Submission problems never undo the archive.
    pub async fn request_generate(
        &mut self,
        session: &mut Session,
        out_dir: &Path,
    ) -> Result<GenerateReport, PipelineError> {
        self.begin()?;
        self.validate(session)?;

        let task_id = session.get_or_create_task_id();
        self.transition(PipelineState::Generating);
        let assembled = match self.assemble(session, &task_id).await {
            Ok(a) => a,
            Err(e) => return Err(self.fail(session, e)),
        };
        let archive_path = match assembled.tree.write_archive(self.format, out_dir).await {
            Ok(path) => path,
            Err(e) => return Err(self.fail(session, e)),
        };

        self.transition(PipelineState::Submitting);
        let payload = build_submission(
            &task_id,
            &session.draft,
            &assembled.items,
            &assembled.artifacts,
            &assembled.sidecars,
        );
        let submission = self.submitter.submit(&payload).await;
        let status = submission.status_line();
        session.notify(match &submission {
            SubmissionOutcome::Saved(_) => Notice::success(status),
            SubmissionOutcome::Skipped => Notice::info(status),
            SubmissionOutcome::Failed(_) => Notice::error(status),
        });

        session.notify(Notice::success(format!("Task package generated: {task_id}")));
        session.reset();
        self.transition(PipelineState::Done);

        Ok(GenerateReport {
            task_id,
            archive_path,
            submission,
        })
    }
}
