//! Sectionizer CLI
//!
//! Local execution entry point for parse jobs, gap filling, validation and
//! job lookups.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use sectionizer::{
    error::Result,
    models::{Artifact, Config, EnhanceMode, JobOptions},
    pipeline::{self, PipelineContext},
    source::open_source,
    storage::JobStore,
};

/// Sectionizer - section hierarchy extraction and validation
#[derive(Parser, Debug)]
#[command(
    name = "sectionizer",
    version,
    about = "Extracts, reconciles and validates the section hierarchy of specification PDFs"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "sectionizer.toml")]
    config: PathBuf,

    /// Override the output directory from the configuration
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a document: ToC pass, body pass, metadata and report
    Parse {
        /// PDF (via pdftotext) or form-feed separated text file
        file: PathBuf,

        /// Skip the table of contents pass
        #[arg(long)]
        no_toc: bool,

        /// Skip the full-body pass
        #[arg(long)]
        no_sections: bool,

        /// Skip the validation report
        #[arg(long)]
        no_report: bool,

        /// Fill coverage gaps with page content after parsing
        #[arg(long)]
        enhance: bool,
    },

    /// Fill coverage gaps in the inventories at the default location
    Enhance {
        /// The document the inventories were extracted from
        file: PathBuf,

        /// Gap-filling strategy (defaults to the configured one)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Validate the inventories at the default location and write the report
    Validate,

    /// Compare the ToC and body inventories at the default location
    Coverage,

    /// Show which artifacts exist for a job
    Status { job_id: String },

    /// Print the path of one of a job's artifacts
    Fetch {
        job_id: String,

        #[arg(value_enum)]
        artifact: ArtifactArg,
    },

    /// Write a sample inventory with deliberate structural defects
    Sample {
        /// Where to write the sample
        #[arg(long, default_value = "test_data.jsonl")]
        path: PathBuf,
    },

    /// Validate and print the effective configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Content,
    Headers,
}

impl From<ModeArg> for EnhanceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Content => EnhanceMode::Content,
            ModeArg::Headers => EnhanceMode::Headers,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ArtifactArg {
    Toc,
    Spec,
    Metadata,
    Report,
}

impl From<ArtifactArg> for Artifact {
    fn from(artifact: ArtifactArg) -> Self {
        match artifact {
            ArtifactArg::Toc => Artifact::Toc,
            ArtifactArg::Spec => Artifact::Spec,
            ArtifactArg::Metadata => Artifact::Metadata,
            ArtifactArg::Report => Artifact::Report,
        }
    }
}

/// Initialize logging based on verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(path: &Path, output_dir: Option<PathBuf>) -> Config {
    let mut config = if path.exists() {
        Config::load_or_default(path)
    } else {
        log::debug!("No config at {}, using defaults", path.display());
        Config::default()
    };
    if let Some(dir) = output_dir {
        config.paths.output_dir = dir.display().to_string();
    }
    config
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli.config, cli.output_dir);
    let store = JobStore::new(&config.paths);

    match cli.command {
        Command::Parse {
            file,
            no_toc,
            no_sections,
            no_report,
            enhance,
        } => {
            let source = open_source(&file)?;
            let options = JobOptions {
                extract_toc: !no_toc,
                extract_sections: !no_sections,
                generate_report: !no_report,
                enhance_content: enhance,
            };
            let response = pipeline::run_job(source.as_ref(), &options, &config)?;
            print_json(&response)?;
        }

        Command::Enhance { file, mode } => {
            if let Some(mode) = mode {
                config.enhance.mode = mode.into();
            }
            let source = open_source(&file)?;
            let mut ctx = PipelineContext::new(config)?;
            let outcome = pipeline::run_enhance(&mut ctx, source.as_ref(), &store.default_storage())?;
            log::info!(
                "Added {} sections, page coverage {:.1}% -> {:.1}%",
                outcome.added.len(),
                outcome.initial_page_coverage,
                outcome.final_page_coverage
            );
        }

        Command::Validate => {
            let report = pipeline::run_validate(&store.default_storage(), &config.paths)?;
            log::info!("Report has {} sheets", report.sheets.len());
        }

        Command::Coverage => {
            let metrics = pipeline::run_coverage(&store.default_storage(), &config.paths)?;
            print_json(&metrics)?;
        }

        Command::Status { job_id } => {
            print_json(&store.status(&job_id)?)?;
        }

        Command::Fetch { job_id, artifact } => {
            let path = store.artifact(&job_id, artifact.into())?;
            println!("{}", path.display());
        }

        Command::Sample { path } => {
            pipeline::write_sample(&path)?;
        }

        Command::Config => {
            config.validate()?;
            log::info!("Config OK");
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    log::debug!("Sectionizer starting...");
    run(cli)
}
