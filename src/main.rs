use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use endpoint_align::formatter::FormattedOutput;
use endpoint_align::{AlignError, Config, run_alignment};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Parser)]
#[command(name = "endpoint-align")]
#[command(about = "Find frontend API calls and navigation targets with no matching route", long_about = None)]
struct Cli {
    /// Config file (default: ./endpoint-align.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend source root
    #[arg(long)]
    backend: Option<PathBuf>,

    /// Frontend source root
    #[arg(long)]
    frontend: Option<PathBuf>,

    /// Backend router entry file used as the mount-graph seed
    #[arg(long)]
    entry: Option<PathBuf>,

    /// Report output path (default: endpoint-alignment-report.md, or .json
    /// with --format json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "markdown")]
    format: Format,

    /// Maximum suggestions per unmatched path
    #[arg(long)]
    suggestions: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> endpoint_align::Result<()> {
    let cwd = std::env::current_dir().map_err(|e| AlignError::io(".", e))?;
    let mut config = Config::load(cli.config.as_deref(), &cwd)?;

    if let Some(backend) = cli.backend {
        config.backend_root = backend;
    }
    if let Some(frontend) = cli.frontend {
        config.frontend_root = frontend;
    }
    if let Some(entry) = cli.entry {
        config.entry_file = entry;
    }
    if let Some(output) = cli.output {
        config.output = output;
    } else if cli.format == Format::Json
        && config.output.extension().is_some_and(|ext| ext == "md")
    {
        config.output.set_extension("json");
    }
    if let Some(limit) = cli.suggestions {
        config.suggestion_limit = limit;
    }

    let report = run_alignment(&config);

    let formatted = match cli.format {
        Format::Markdown => FormattedOutput::markdown(&report, Some(&cwd)),
        Format::Json => FormattedOutput::json(&report)?,
    };
    std::fs::write(&config.output, &formatted.content)
        .map_err(|e| AlignError::io(&config.output, e))?;

    // Advisory only: findings never affect the exit code.
    println!(
        "Unmatched API references: {}, unmatched navigation targets: {} (report: {})",
        report.unmatched_api_calls.len(),
        report.unmatched_navigation.len(),
        config.output.display()
    );

    Ok(())
}
