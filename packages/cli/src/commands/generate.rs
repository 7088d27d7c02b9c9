use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use common::config::{ArchiveFormat, TaskgenConfig};
use taskgen::{Pipeline, SubmissionClient, SubmissionOutcome};
use tracing::info;

use super::load_session;
use crate::style::{print_info, print_notices, print_success};

pub struct GenerateOptions {
    pub out: PathBuf,
    pub format: Option<ArchiveFormat>,
    pub no_submit: bool,
    pub api_url: Option<String>,
}

fn submitter(config: &TaskgenConfig, opts: &GenerateOptions) -> Result<SubmissionClient> {
    if opts.no_submit {
        return Ok(SubmissionClient::disabled());
    }
    let mut api = config.api.clone();
    if let Some(url) = &opts.api_url {
        api.base_url = url.clone();
        api.enabled = true;
    }
    SubmissionClient::new(&api).context("Failed to build collector client")
}

pub async fn run(manifest: &Path, opts: GenerateOptions) -> Result<ExitCode> {
    let config = TaskgenConfig::load()?;
    let format = opts.format.unwrap_or(config.package.format);
    let (mut loaded, mut session) = load_session(manifest).await?;
    let mut pipeline = Pipeline::from_config(&config)?
        .with_format(format)
        .with_submitter(submitter(&config, &opts)?);

    std::fs::create_dir_all(&opts.out)
        .with_context(|| format!("Failed to create {}", opts.out.display()))?;
    info!(manifest = %manifest.display(), out = %opts.out.display(), "Generating task package");

    let report = match pipeline.request_generate(&mut session, &opts.out).await {
        Ok(report) => report,
        Err(_) => {
            print_notices(&session.take_notices());
            return Ok(ExitCode::FAILURE);
        }
    };

    print_success(&format!("Archive written to {}", report.archive_path.display()));
    loaded.remember_task_id(None)?;
    print_notices(&session.take_notices());
    if let SubmissionOutcome::Saved(record) = &report.submission {
        print_info(&format!("Collector record id: {}", record.id));
    }
    Ok(ExitCode::SUCCESS)
}
