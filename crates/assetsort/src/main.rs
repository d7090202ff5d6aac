//! `assetsort` command line
//!
//! - `assetsort classify --files a.png b.png` classifies a file listing
//! - `assetsort classify --state snapshot.json` resumes from a snapshot
//! - `assetsort validate` checks that the catalog builds a valid graph

use anyhow::{bail, Context, Result};
use assetsort::{
    ClassificationService, ClassificationState, Completion, LibraryConfig,
};
use assetsort_llm::noop_client;
use assetsort_logging::{init_logging, LogConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "assetsort", about = "Classify discovered files into typed, named and tagged assets")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Also write logs to ~/.assetsort/logs
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a file listing or a saved snapshot
    Classify {
        /// Filenames to classify, in order
        #[arg(long, num_args = 1.., conflicts_with = "state", required_unless_present = "state")]
        files: Vec<String>,

        /// Snapshot to resume from
        #[arg(long)]
        state: Option<PathBuf>,

        /// Library catalog (defaults to ~/.assetsort/library.toml)
        #[arg(short, long, env = "ASSETSORT_CONFIG")]
        config: Option<PathBuf>,

        /// Write the resulting snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail when any module was left unexecuted
        #[arg(long)]
        strict: bool,

        /// Never contact a completion backend
        #[arg(long)]
        no_llm: bool,
    },

    /// Build the classification graph from a catalog and check it
    Validate {
        /// Library catalog (defaults to ~/.assetsort/library.toml)
        #[arg(short, long, env = "ASSETSORT_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<LibraryConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            LibraryConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => LibraryConfig::load_default().context("failed to load default config")?,
    };
    Ok(config)
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Classify {
            files,
            state,
            config,
            output,
            strict,
            no_llm,
        } => {
            let library = load_config(config.as_deref())?;
            let client = no_llm.then(noop_client);
            let mut service = ClassificationService::new(&library, client)
                .context("failed to build classification pipeline")?;
            if strict {
                service = service.with_completion(Completion::Strict);
            }

            let mut snapshot = match state {
                Some(path) => ClassificationState::load(&path)
                    .with_context(|| format!("failed to read snapshot {}", path.display()))?,
                None => ClassificationService::from_file_list(files),
            };

            let report = service
                .classify_with_report(&mut snapshot)
                .context("classification failed")?;
            info!(
                executed = report.executed.len(),
                pruned = ?report.pruned,
                "pipeline finished"
            );

            match output {
                Some(path) => {
                    snapshot
                        .save(&path)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    let summary = snapshot.summary();
                    eprintln!(
                        "{} files, {} assets ({} unassigned files) -> {}",
                        summary.files,
                        summary.assets,
                        summary.unassigned_files,
                        path.display()
                    );
                }
                None => println!("{}", snapshot.to_json()?),
            }
            Ok(())
        }

        Commands::Validate { config } => {
            let library = load_config(config.as_deref())?;
            let service = ClassificationService::new(&library, Some(noop_client()))
                .context("failed to build classification pipeline")?;
            service.validate().context("pipeline is invalid")?;
            println!(
                "ok: {} filetypes, {} asset types, {} modules",
                library.file_types.len(),
                library.merged_asset_types().len(),
                service.pipeline().len()
            );
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "assetsort",
        verbose: cli.verbose,
        log_to_file: cli.log_file,
    }) {
        eprintln!("warning: logging disabled: {err:?}");
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}
