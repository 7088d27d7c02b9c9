//! `taskgen` - author, preview and package rubric-graded tasks.

mod commands;
mod manifest;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use common::config::ArchiveFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskgen")]
#[command(version)]
#[command(about = "Author, preview and package rubric-graded tasks", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Zip,
    TarGz,
}

impl From<FormatArg> for ArchiveFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Zip => ArchiveFormat::Zip,
            FormatArg::TarGz => ArchiveFormat::TarGz,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List sectors and their occupations
    Sectors {
        /// Only show occupations of this sector
        #[arg(short, long)]
        sector: Option<String>,
    },

    /// Interactively write a task manifest
    Init {
        /// Where to write the manifest
        #[arg(short, long, default_value = manifest::DEFAULT_MANIFEST)]
        output: PathBuf,
    },

    /// Validate a manifest and show the package it would produce
    Preview {
        /// Path to the task manifest
        #[arg(default_value = manifest::DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },

    /// Build the package archive and submit it to the collector
    Generate {
        /// Path to the task manifest
        #[arg(default_value = manifest::DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Output directory for the archive
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Archive format (defaults to package.format from config)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Skip the collector submission
        #[arg(long)]
        no_submit: bool,

        /// Collector base URL
        #[arg(long, env = "TASKGEN_API_URL")]
        api_url: Option<String>,
    },

    /// Grade an output directory against the manifest's rubric
    Judge {
        /// Path to the task manifest
        #[arg(default_value = manifest::DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Directory holding the outputs to grade
        #[arg(long)]
        output_dir: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Sectors { sector } => commands::sectors::run(sector.as_deref()),
        Commands::Init { output } => commands::init::run(&output),
        Commands::Preview { manifest } => commands::preview::run(&manifest).await,
        Commands::Generate {
            manifest,
            out,
            format,
            no_submit,
            api_url,
        } => {
            let opts = commands::generate::GenerateOptions {
                out,
                format: format.map(Into::into),
                no_submit,
                api_url,
            };
            commands::generate::run(&manifest, opts).await
        }
        Commands::Judge {
            manifest,
            output_dir,
        } => commands::judge::run(&manifest, &output_dir).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            style::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
