use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use common::config::TaskgenConfig;
use console::style;
use taskgen::{Pipeline, SubmissionClient};

use super::load_session;
use crate::style::{print_header, print_notices};

pub async fn run(manifest: &Path) -> Result<ExitCode> {
    let config = TaskgenConfig::load()?;
    let (mut loaded, mut session) = load_session(manifest).await?;
    let mut pipeline = Pipeline::from_config(&config)?.with_submitter(SubmissionClient::disabled());

    let preview = match pipeline.request_preview(&mut session).await {
        Ok(preview) => preview,
        Err(_) => {
            print_notices(&session.take_notices());
            return Ok(ExitCode::FAILURE);
        }
    };
    print_notices(&session.take_notices());
    loaded.remember_task_id(Some(&preview.task_id))?;

    println!("Task ID: {}", style(&preview.task_id).cyan().bold());
    print_header("Package structure");
    println!("{}", preview.tree.render());
    print_header("task.yaml");
    println!("{}", preview.task_yaml());
    print_header("solution.sh");
    println!("{}", preview.solution_sh());
    Ok(ExitCode::SUCCESS)
}
