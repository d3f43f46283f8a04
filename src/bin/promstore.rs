//! PromStore command line
//!
//! One-shot operations over exposition files: inspect what a file holds,
//! re-export it in canonical order, or extend a metric with synthetic
//! history.
//!
//! # Commands
//!
//! - `metrics <file>` - List metric names
//! - `labels <file> <metric>` - Show label names and values of a metric
//! - `summary <file>` - Sample/series counts and time bounds per metric
//! - `export <file> [--match REGEX] [--out FILE]` - Canonical re-export
//! - `backfill <file> <metric> [--steps N] [--step DUR] [--out FILE]` - Add history, then export
//! - `check-config` - Validate configuration
//!
//! # Configuration
//!
//! Read from `--config`, then `PROMSTORE_CONFIG`, then `./promstore.toml` if
//! present, otherwise defaults. Environment overrides apply on top.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use kuba_promstore::{
    backfill::{BackfillOptions, BackfillOutcome},
    config::Config,
    duration::format_duration,
    export,
    ingestion::{Loader, NameFilter},
    store::MetricStore,
};

#[derive(Parser)]
#[command(name = "promstore")]
#[command(author = "Victor Oseghale")]
#[command(version)]
#[command(about = "Inspect, re-export and backfill metrics exposition files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (overrides PROMSTORE_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List metric names in a file
    Metrics {
        /// Exposition file
        file: PathBuf,
    },

    /// Show the label names and values of one metric
    Labels {
        /// Exposition file
        file: PathBuf,
        /// Metric name
        metric: String,
    },

    /// Per-metric sample counts and time bounds
    Summary {
        /// Exposition file
        file: PathBuf,
    },

    /// Re-export a file in canonical order
    Export {
        /// Exposition file
        file: PathBuf,
        /// Only families whose name matches this regex
        #[arg(short, long = "match")]
        pattern: Option<String>,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Add synthetic history to a metric, then export
    Backfill {
        /// Exposition file
        file: PathBuf,
        /// Metric name
        metric: String,
        /// Points per series (defaults to backfill.steps)
        #[arg(long)]
        steps: Option<String>,
        /// Spacing between points, e.g. 1m (defaults to backfill.step)
        #[arg(long)]
        step: Option<String>,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate configuration and print the effective settings
    CheckConfig,
}

/// Resolve and load configuration
fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os("PROMSTORE_CONFIG").map(PathBuf::from))
        .or_else(|| {
            let local = PathBuf::from("promstore.toml");
            local.exists().then_some(local)
        });

    let config = match path {
        Some(path) => Config::from_file_with_env(&path)?,
        None => Config::from_env(),
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.logging.with_target)
        .with_writer(std::io::stderr)
        .init();
}

fn load_store(
    config: &Config,
    file: &Path,
    filter: &NameFilter,
) -> Result<MetricStore, Box<dyn std::error::Error>> {
    let mut store = MetricStore::new();
    let families =
        Loader::with_config(&config.ingest).load_file_filtered(&mut store, file, filter)?;
    debug!(file = %file.display(), families, "Loaded file");
    Ok(store)
}

fn write_output(store: &MetricStore, out: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match out {
        Some(path) => {
            export::save_file(store, path)?;
            info!(path = %path.display(), samples = store.sample_count(), "Wrote export");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            export::save(store, &mut lock)?;
        }
    }
    Ok(())
}

fn cmd_metrics(config: &Config, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config, file, &NameFilter::All)?;
    for name in store.metric_names() {
        match store.help(&name) {
            Some(help) => println!("{}  # {}", name, help.replace('\n', " ")),
            None => println!("{}", name),
        }
    }
    Ok(())
}

fn cmd_labels(config: &Config, file: &Path, metric: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config, file, &NameFilter::All)?;
    let summary = store.label_summary(metric)?;

    if summary.is_empty() {
        println!("{} has no labels", metric);
    }
    for (name, values) in summary {
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        println!("{}: {}", name, values.join(", "));
    }
    Ok(())
}

fn cmd_summary(config: &Config, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(config, file, &NameFilter::All)?;

    println!(
        "{:<48} {:>8} {:>8} {:>15} {:>15}",
        "METRIC", "SERIES", "SAMPLES", "FIRST", "LAST"
    );
    for name in store.metric_names() {
        let ts = store.timestamp_summary(&name)?;
        println!(
            "{:<48} {:>8} {:>8} {:>15} {:>15}",
            name, ts.series, ts.samples, ts.min, ts.max
        );
    }
    println!();
    println!(
        "{} metrics, {} samples",
        store.metric_count(),
        store.sample_count()
    );
    Ok(())
}

fn cmd_export(
    config: &Config,
    file: &Path,
    pattern: Option<&str>,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match pattern {
        Some(p) => NameFilter::regex(p)?,
        None => NameFilter::All,
    };
    let store = load_store(config, file, &filter)?;
    write_output(&store, out)
}

fn cmd_backfill(
    config: &Config,
    file: &Path,
    metric: &str,
    steps: Option<&str>,
    step: Option<&str>,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = load_store(config, file, &NameFilter::All)?;

    let options = BackfillOptions::from_config(&config.backfill).with_overrides(steps, step)?;

    match options.run(&mut store, metric)? {
        BackfillOutcome::Skipped { reason } => eprintln!("Backfill skipped: {}", reason),
        BackfillOutcome::Completed {
            series,
            added,
            suppressed,
        } => eprintln!(
            "Backfilled {}: {} series, {} samples added, {} duplicates suppressed (step {})",
            metric,
            series,
            added,
            suppressed,
            format_duration(options.step_ms)
        ),
    }

    write_output(&store, out)
}

fn cmd_check_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Configuration is valid!");
    println!();
    println!("Ingest:");
    println!("  Max line length: {} bytes", config.ingest.max_line_length);
    match config.ingest.default_timestamp_ms {
        Some(ts) => println!("  Default timestamp: {} ms", ts),
        None => println!("  Default timestamp: load time"),
    }
    println!();
    println!("Backfill:");
    println!("  Steps: {}", config.backfill.steps);
    println!("  Step: {}", config.backfill.step);
    println!();
    println!("Logging:");
    println!("  Level: {}", config.logging.level);

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config);

    match &cli.command {
        Commands::Metrics { file } => cmd_metrics(&config, file),
        Commands::Labels { file, metric } => cmd_labels(&config, file, metric),
        Commands::Summary { file } => cmd_summary(&config, file),
        Commands::Export { file, pattern, out } => {
            cmd_export(&config, file, pattern.as_deref(), out.as_deref())
        }
        Commands::Backfill {
            file,
            metric,
            steps,
            step,
            out,
        } => cmd_backfill(
            &config,
            file,
            metric,
            steps.as_deref(),
            step.as_deref(),
            out.as_deref(),
        ),
        Commands::CheckConfig => cmd_check_config(&config),
    }
}
