//! Rubric-scored evaluation by a language-model judge.
//!
//! The same contract is rendered into the generated `tests/test_outputs.py`;
//! this module is the in-process implementation used by `taskgen judge`.

mod ladder;
mod openai;
mod parse;
mod prompt;
mod schema;

use std::path::PathBuf;

use common::retry::RetryAttempt;
use thiserror::Error;

pub use ladder::{JudgeLadder, JudgeProvider, Verdict};
pub use openai::OpenAiJudge;
pub use parse::{JudgeParse, extract_json};
pub use prompt::{MAX_FILE_CHARS, OutputFile, build_prompt, collect_outputs};
pub use schema::{
    PASS_FRACTION, SchemaViolation, ScoreCard, ScoreField, ScoreSchema, scoring_guide,
};

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Judge request failed: {0}")]
    Transport(String),

    #[error("Judge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Judge response contained no JSON object")]
    Unparsable,

    #[error("Judge response failed validation: {}", format_violations(.0))]
    Invalid(Vec<SchemaViolation>),

    #[error("Judge unavailable after {} failed attempts", .attempts.len())]
    Exhausted { attempts: Vec<RetryAttempt> },

    #[error("No judge providers configured")]
    NoProviders,

    #[error("Environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Output directory {0} does not exist")]
    OutputMissing(PathBuf),

    #[error("Output directory {0} is empty")]
    OutputEmpty(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        JudgeError::Transport(err.to_string())
    }
}
