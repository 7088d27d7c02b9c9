use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use common::config::TaskgenConfig;
use console::style;
use taskgen::judge::{
    OpenAiJudge, ScoreSchema, build_prompt, collect_outputs, scoring_guide,
};
use tracing::info;

use crate::manifest::TaskManifest;
use crate::style::{print_error, print_header, print_success};

pub async fn run(manifest: &Path, output_dir: &Path) -> Result<ExitCode> {
    let config = TaskgenConfig::load()?;
    let draft = TaskManifest::load(manifest)?.manifest.to_draft();
    let items = draft.rubric.list_items();
    let schema = ScoreSchema::from_rubric(&items);

    let outputs = collect_outputs(output_dir)
        .await
        .with_context(|| format!("Cannot grade {}", output_dir.display()))?;
    let prompt = build_prompt(
        draft.instruction_text(),
        &scoring_guide(&items),
        &schema,
        &outputs,
    );

    let ladder = OpenAiJudge::ladder_from_config(&config.judge)?;
    info!(providers = ?ladder.provider_names(), files = outputs.len(), "Judging outputs");
    let verdict = ladder.evaluate(&prompt, &schema).await?;

    print_header("Scores");
    for ((key, points), field) in verdict.card.scores.iter().zip(&schema.fields) {
        println!(
            "  {:<32} {:>3} / {:<3} {}",
            field.label,
            points,
            field.max_points,
            style(key).dim()
        );
    }
    println!();
    println!(
        "  Total: {} / {} (judged by {}, round {})",
        style(verdict.card.total).bold(),
        schema.max_total,
        verdict.provider,
        verdict.round
    );
    if !verdict.card.feedback.is_empty() {
        print_header("Feedback");
        println!("{}", verdict.card.feedback);
    }
    println!();

    if verdict.passed {
        print_success("PASS");
        Ok(ExitCode::SUCCESS)
    } else {
        print_error("FAIL");
        Ok(ExitCode::FAILURE)
    }
}
