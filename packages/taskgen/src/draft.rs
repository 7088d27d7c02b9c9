use std::fmt;

use common::filename::{is_valid_task_name, slugify};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::attachment::{AttachmentKind, AttachmentSet};
use crate::error::ValidationError;
use crate::rubric::{MIN_RUBRIC_ITEMS, RubricModel};
use crate::taxonomy;

pub const MIN_INSTRUCTION_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    #[default]
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `round(hours * 60)`; negative and non-finite inputs count as zero.
pub fn hours_to_minutes(hours: f64) -> u32 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    (hours * 60.0).round() as u32
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 6;

/// Package identifier: `<6 random base36 chars>_<slug>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate(slug: &str) -> Self {
        let mut rng = rand::rng();
        let prefix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(format!("{prefix}_{slug}"))
    }

    /// Accept a previously issued id, but only if it belongs to `slug`.
    pub fn parse(raw: &str, slug: &str) -> Option<Self> {
        let (prefix, rest) = raw.split_once('_')?;
        let well_formed = prefix.len() == ID_SUFFIX_LEN
            && prefix.bytes().all(|b| ID_ALPHABET.contains(&b))
            && rest == slug;
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the author entered for one task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub task_name: String,
    pub sector: String,
    pub occupation: String,
    pub instruction: String,
    pub difficulty: Difficulty,
    pub expert_hours: f64,
    pub junior_hours: f64,
    pub rubric: RubricModel,
    pub reference_files: AttachmentSet,
    pub solution_files: AttachmentSet,
}

impl TaskDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachments(&self, kind: AttachmentKind) -> &AttachmentSet {
        match kind {
            AttachmentKind::Reference => &self.reference_files,
            AttachmentKind::Solution => &self.solution_files,
        }
    }

    pub fn attachments_mut(&mut self, kind: AttachmentKind) -> &mut AttachmentSet {
        match kind {
            AttachmentKind::Reference => &mut self.reference_files,
            AttachmentKind::Solution => &mut self.solution_files,
        }
    }

    pub fn task_name(&self) -> &str {
        self.task_name.trim()
    }

    pub fn instruction_text(&self) -> &str {
        self.instruction.trim()
    }

    pub fn expert_minutes(&self) -> u32 {
        hours_to_minutes(self.expert_hours)
    }

    pub fn junior_minutes(&self) -> u32 {
        hours_to_minutes(self.junior_hours)
    }

    /// Aggregate duration budget, derived from the expert estimate.
    pub fn estimated_duration_sec(&self) -> u64 {
        u64::from(self.expert_minutes()) * 60
    }

    pub fn occupation_tag(&self) -> String {
        slugify(&self.occupation)
    }

    /// Human-readable part of the task id: the task name, else the occupation.
    pub fn id_slug(&self) -> String {
        let name = self.task_name();
        if !name.is_empty() {
            return name.to_string();
        }
        let tag = self.occupation_tag();
        let tag = tag.trim_matches('-');
        if tag.is_empty() {
            "task".to_string()
        } else {
            tag.to_string()
        }
    }

    /// Pre-flight gate. Checks run in a fixed order and the first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.task_name();
        if name.is_empty() {
            return Err(ValidationError::MissingTaskName);
        }
        if !is_valid_task_name(name) {
            return Err(ValidationError::InvalidTaskName);
        }

        let sector_name = self.sector.trim();
        if sector_name.is_empty() {
            return Err(ValidationError::MissingSector);
        }
        let sector = taxonomy::find_sector(sector_name)
            .ok_or_else(|| ValidationError::UnknownSector(sector_name.to_string()))?;

        let occupation = self.occupation.trim();
        if occupation.is_empty() {
            return Err(ValidationError::MissingOccupation);
        }
        if !sector.has_occupation(occupation) {
            return Err(ValidationError::OccupationNotInSector {
                occupation: occupation.to_string(),
                sector: sector.name.to_string(),
            });
        }

        let len = self.instruction_text().chars().count();
        if len < MIN_INSTRUCTION_CHARS {
            return Err(ValidationError::InstructionTooShort { len });
        }

        if self.solution_files.is_empty() {
            return Err(ValidationError::MissingSolutionFiles);
        }

        let count = self.rubric.list_items().len();
        if count < MIN_RUBRIC_ITEMS {
            return Err(ValidationError::TooFewRubricItems { count });
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::attachment::Attachment;
    use crate::rubric::RubricItem;

    pub(crate) fn sample_draft() -> TaskDraft {
        let mut draft = TaskDraft::new();
        draft.task_name = "sample-task".into();
        draft.sector = "Government".into();
        draft.occupation = "Compliance Officers".into();
        draft.instruction =
            "Review the attached policy and list every compliance gap you find.".into();
        draft.expert_hours = 1.5;
        draft.junior_hours = 4.0;
        draft.rubric = RubricModel::from_items([
            RubricItem::new("Accuracy", "Gaps are real", 10),
            RubricItem::new("Coverage", "", 15),
            RubricItem::new("Clarity", "Readable report", 5),
        ]);
        draft
            .solution_files
            .add(Attachment::from_bytes("answer.txt", b"gaps".to_vec()))
            .unwrap();
        draft
    }

    #[test]
    fn valid_draft_passes() {
        assert_eq!(sample_draft().validate(), Ok(()));
    }

    #[test]
    fn first_failure_wins() {
        let mut draft = sample_draft();
        draft.task_name = "Bad Name".into();
        draft.sector.clear();
        assert_eq!(draft.validate(), Err(ValidationError::InvalidTaskName));

        draft.task_name = "  ".into();
        assert_eq!(draft.validate(), Err(ValidationError::MissingTaskName));
    }

    #[test]
    fn occupation_must_belong_to_sector() {
        let mut draft = sample_draft();
        draft.occupation = "Software Developers".into();
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::OccupationNotInSector { .. })
        ));

        draft.sector = "Agriculture".into();
        assert_eq!(
            draft.validate(),
            Err(ValidationError::UnknownSector("Agriculture".into()))
        );
    }

    #[test]
    fn instruction_length_uses_trimmed_text() {
        let mut draft = sample_draft();
        draft.instruction = format!("   {}   ", "x".repeat(49));
        assert_eq!(
            draft.validate(),
            Err(ValidationError::InstructionTooShort { len: 49 })
        );
        draft.instruction = "x".repeat(50);
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn requires_solution_files_and_named_rubric() {
        let mut draft = sample_draft();
        draft.solution_files.clear();
        assert_eq!(draft.validate(), Err(ValidationError::MissingSolutionFiles));

        let mut draft = sample_draft();
        draft.rubric = RubricModel::from_items([RubricItem::new("Only", "", 10)]);
        assert_eq!(
            draft.validate(),
            Err(ValidationError::TooFewRubricItems { count: 1 })
        );
    }

    #[test]
    fn duration_conversion_is_exact() {
        for (hours, minutes) in [(0.0, 0), (1.5, 90), (0.0125, 1), (0.0083, 0), (2.999, 180)] {
            let mut draft = sample_draft();
            draft.expert_hours = hours;
            assert_eq!(draft.expert_minutes(), minutes, "hours = {hours}");
            assert_eq!(draft.estimated_duration_sec(), u64::from(minutes) * 60);
        }
        assert_eq!(hours_to_minutes(-2.0), 0);
        assert_eq!(hours_to_minutes(f64::NAN), 0);
    }

    #[test]
    fn task_id_has_random_prefix_and_slug() {
        let id = TaskId::generate("sample-task");
        let (prefix, slug) = id.as_str().split_once('_').unwrap();
        assert_eq!(prefix.len(), 6);
        assert!(prefix.bytes().all(|b| ID_ALPHABET.contains(&b)));
        assert_eq!(slug, "sample-task");
    }

    #[test]
    fn issued_ids_parse_only_for_their_slug() {
        let id = TaskId::generate("sample-task");
        assert_eq!(TaskId::parse(id.as_str(), "sample-task"), Some(id.clone()));
        assert_eq!(TaskId::parse(id.as_str(), "other-task"), None);
        assert_eq!(TaskId::parse("ABC123_sample-task", "sample-task"), None);
        assert_eq!(TaskId::parse("abc12_sample-task", "sample-task"), None);
        assert_eq!(TaskId::parse("sample-task", "sample-task"), None);
    }

    #[test]
    fn id_slug_falls_back_to_occupation() {
        let mut draft = sample_draft();
        draft.task_name.clear();
        assert_eq!(draft.id_slug(), "compliance-officers");
    }
}
