use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, error};
use minipack::{config::Config, orchestrator::BundleOrchestrator};

#[derive(Parser, Debug)]
#[command(
    name = "minipack",
    version,
    about = "Bundle an ES module graph into a single self-contained JavaScript file"
)]
struct Cli {
    /// Project config file (defaults to minipack.toml in the current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Entry module, relative to the current directory
    #[arg(short, long, value_name = "FILE")]
    entry: Option<PathBuf>,

    /// Directory the bundle is written to
    #[arg(short = 'o', long, value_name = "DIR")]
    output_path: Option<PathBuf>,

    /// File name of the bundle inside the output directory
    #[arg(short = 'f', long, value_name = "NAME")]
    output_filename: Option<String>,

    /// Evaluate each module once and share its exports between importers
    #[arg(long)]
    cache_modules: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Overlay command-line flags, the highest-precedence config layer
    fn apply_to(&self, config: &mut Config) {
        if let Some(entry) = &self.entry {
            config.entry = entry.clone();
        }
        if let Some(path) = &self.output_path {
            config.output.path = path.clone();
        }
        if let Some(filename) = &self.output_filename {
            config.output.filename = filename.clone();
        }
        if self.cache_modules {
            config.runtime.cache_modules = true;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::new();
    logger.filter_level(LevelFilter::Warn).parse_default_env();
    if let Some(level) = verbosity_level(cli.verbose) {
        logger.filter_level(level);
    }
    logger.format_timestamp(None).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Level requested with `-v`; without the flag `RUST_LOG` (or warn) applies
fn verbosity_level(verbose: u8) -> Option<LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let project_root = std::env::current_dir().context("Failed to determine current directory")?;

    let mut config = Config::load(cli.config.as_deref(), &project_root)?;
    cli.apply_to(&mut config);
    debug!("Effective configuration: {config:?}");

    BundleOrchestrator::new(&config, &project_root)
        .bundle()
        .context("Bundling failed")?;
    Ok(())
}
