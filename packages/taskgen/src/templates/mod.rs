//! Text artifacts written into every task package.
//!
//! All functions are pure: the same draft and rubric always render the same
//! bytes.

use std::borrow::Cow;
use std::fmt::Write;

use common::config::JudgeConfig;

use crate::draft::TaskDraft;
use crate::judge::{ScoreSchema, scoring_guide};
use crate::rubric::{RubricItem, total_points};

const DOCKERFILE: &str = include_str!("Dockerfile.tmpl");
const DOCKER_COMPOSE: &str = include_str!("docker-compose.yaml.tmpl");
const RUN_TESTS: &str = include_str!("run-tests.sh.tmpl");
const TEST_OUTPUTS: &str = include_str!("test_outputs.py.tmpl");

pub const MAX_AGENT_TIMEOUT_SEC: f64 = 900.0;
pub const MAX_TEST_TIMEOUT_SEC: f64 = 300.0;

/// The rendered text files of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub task_yaml: String,
    pub solution_sh: String,
    pub dockerfile: String,
    pub docker_compose: String,
    pub run_tests_sh: String,
    pub test_outputs_py: String,
}

impl Artifacts {
    pub fn render(draft: &TaskDraft, items: &[RubricItem], judge: &JudgeConfig) -> Self {
        Self {
            task_yaml: task_yaml(draft, items),
            solution_sh: solution_sh(draft),
            dockerfile: dockerfile(!draft.reference_files.is_empty()),
            docker_compose: docker_compose(),
            run_tests_sh: run_tests_sh(),
            test_outputs_py: test_outputs_py(draft, items, judge),
        }
    }
}

/// Instruction followed by the rubric summary, as embedded in `task.yaml`.
pub fn full_instruction(draft: &TaskDraft, items: &[RubricItem]) -> String {
    let mut text = draft.instruction_text().replace("\r\n", "\n");
    let _ = write!(text, "\n\nRubric: {} points", total_points(items));
    for item in items {
        let _ = write!(
            text,
            "\n  - {} ({} points): {}",
            item.name,
            item.points,
            item.description_or_default()
        );
    }
    text
}

pub fn task_yaml(draft: &TaskDraft, items: &[RubricItem]) -> String {
    let mut yaml = String::from("instruction: |-\n");
    for line in full_instruction(draft, items).split('\n') {
        if line.is_empty() {
            yaml.push('\n');
        } else {
            let _ = writeln!(yaml, "  {line}");
        }
    }
    let _ = writeln!(yaml, "difficulty: {}", draft.difficulty);
    yaml.push_str("category: gdpval\n");
    yaml.push_str("tags:\n  - gdpval\n");
    let _ = writeln!(yaml, "  - {}", yaml_scalar(&draft.occupation_tag()));
    yaml.push_str("parser_name: pytest\n");
    let _ = writeln!(yaml, "max_agent_timeout_sec: {MAX_AGENT_TIMEOUT_SEC:.1}");
    let _ = writeln!(yaml, "max_test_timeout_sec: {MAX_TEST_TIMEOUT_SEC:.1}");
    yaml.push_str("run_tests_in_same_shell: false\n");
    yaml.push_str("disable_asciinema: false\n");
    let _ = writeln!(yaml, "estimated_duration_sec: {}", draft.estimated_duration_sec());
    let _ = writeln!(yaml, "expert_time_estimate_min: {}", draft.expert_minutes());
    let _ = writeln!(yaml, "junior_time_estimate_min: {}", draft.junior_minutes());
    let _ = writeln!(yaml, "sector: {}", yaml_scalar(draft.sector.trim()));
    let _ = writeln!(yaml, "occupation: {}", yaml_scalar(draft.occupation.trim()));
    yaml
}

/// Plain scalar when safe, otherwise a double-quoted (JSON-compatible) one.
fn yaml_scalar(value: &str) -> Cow<'_, str> {
    const INDICATORS: &[char] = &[
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%',
        '@', '`',
    ];
    let lower = value.to_ascii_lowercase();
    let needs_quotes = value.is_empty()
        || value != value.trim()
        || value.starts_with(INDICATORS)
        || value.ends_with(':')
        || value.contains(": ")
        || value.contains(" #")
        || value.contains(['\n', '\t', '\r'])
        || matches!(
            lower.as_str(),
            "true" | "false" | "yes" | "no" | "on" | "off" | "null" | "~"
        )
        || value.parse::<f64>().is_ok();

    if needs_quotes {
        Cow::Owned(serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn shell_quote(name: &str) -> Cow<'_, str> {
    shlex::try_quote(name)
        .unwrap_or_else(|_| Cow::Owned(format!("'{}'", name.replace('\'', "'\\''"))))
}

/// Copies every solution file into `/app/output`. A failed copy warns and
/// the script still exits successfully.
pub fn solution_sh(draft: &TaskDraft) -> String {
    let mut script = String::from(
        "#!/bin/bash\n\
         mkdir -p /app/output\n\
         \n\
         copy_solution() {\n\
         \x20   if ! cp \"/solution/$1\" /app/output/; then\n\
         \x20       echo \"warning: could not copy $1\" >&2\n\
         \x20   fi\n\
         }\n\
         \n",
    );
    for file in &draft.solution_files {
        let _ = writeln!(script, "copy_solution {}", shell_quote(file.name()));
    }
    script.push_str("\nexit 0\n");
    script
}

pub fn dockerfile(has_data: bool) -> String {
    let copy = if has_data {
        "\nCOPY data/ /app/data/\n"
    } else {
        ""
    };
    DOCKERFILE.replace("__COPY_DATA__", copy)
}

pub fn docker_compose() -> String {
    DOCKER_COMPOSE.to_string()
}

pub fn run_tests_sh() -> String {
    RUN_TESTS.to_string()
}

fn py_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// The judged-evaluation pytest module.
pub fn test_outputs_py(draft: &TaskDraft, items: &[RubricItem], judge: &JudgeConfig) -> String {
    let schema = ScoreSchema::from_rubric(items);

    let mut fields = String::new();
    for field in &schema.fields {
        let _ = writeln!(
            fields,
            "    {}: int = Field(ge=0, le={}, description={})",
            field.key,
            field.max_points,
            py_str(&format!("{}: {}", field.label, field.description))
        );
    }
    let fields = fields.trim_end_matches('\n');

    let mut models = vec![py_str(&judge.primary_model)];
    if judge.fallback_model != judge.primary_model {
        models.push(py_str(&judge.fallback_model));
    }
    let backoff_sec = judge.backoff_base_ms as f64 / 1000.0;
    let backoff_max_sec = judge.backoff_max_ms.max(judge.backoff_base_ms) as f64 / 1000.0;

    fill(
        TEST_OUTPUTS,
        &[
            ("__INSTRUCTION__", py_str(&full_instruction(draft, items))),
            ("__SCORING_GUIDE__", py_str(&scoring_guide(items))),
            ("__MAX_TOTAL__", schema.max_total.to_string()),
            ("__MODELS__", format!("[{}]", models.join(", "))),
            ("__MAX_RETRIES__", judge.max_retries.max(1).to_string()),
            ("__BACKOFF_BASE_SEC__", format!("{backoff_sec:?}")),
            ("__BACKOFF_MAX_SEC__", format!("{backoff_max_sec:?}")),
            ("__SCORE_FIELDS__", fields.to_string()),
        ],
    )
}

/// Substitutes placeholders in one left-to-right pass. Inserted values are
/// never scanned again, so author text containing a placeholder survives.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, value)))
            .min_by_key(|(pos, _, _)| *pos);
        match next {
            Some((pos, key, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
