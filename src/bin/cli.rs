use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pbj_wrapped::export::export_summaries;
use pbj_wrapped::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pbjcli")]
#[command(about = "PBJ Wrapped CLI - Quarterly nursing-home staffing summaries for the USA, states and CMS regions", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config path, then PBJ_* variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one scope (e.g. "usa", "new-york", "NY", "region-2")
    Summary(SummaryArgs),
    /// Summarize every scope and export the results
    Batch(BatchArgs),
    /// Show how an identifier resolves
    Resolve(ResolveArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct DataArgs {
    /// Directory containing the PBJ data files
    #[arg(short, long)]
    data_dir: PathBuf,
    /// Current quarter, e.g. 2025Q2
    #[arg(short, long)]
    quarter: QuarterTag,
    /// Prior quarter (defaults to the preceding quarter when its files exist)
    #[arg(long)]
    prior: Option<QuarterTag>,
    /// Print collected diagnostics after the run
    #[arg(long)]
    diagnostics: bool,
}

#[derive(Args)]
struct SummaryArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Scope identifier
    identifier: String,
    /// Write JSON to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct BatchArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
    /// Export format (defaults to the configured format)
    #[arg(long, value_enum)]
    format: Option<ExportFormatOpt>,
}

#[derive(Args)]
struct ResolveArgs {
    identifier: String,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ExportFormatOpt {
    Json,
    Jsonl,
    Csv,
}

impl From<ExportFormatOpt> for ExportFormat {
    fn from(opt: ExportFormatOpt) -> Self {
        match opt {
            ExportFormatOpt::Json => ExportFormat::Json,
            ExportFormatOpt::Jsonl => ExportFormat::JsonLines,
            ExportFormatOpt::Csv => ExportFormat::Csv,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Summary(args) => cmd_summary(args, config),
        Commands::Batch(args) => cmd_batch(args, config),
        Commands::Resolve(args) => cmd_resolve(args),
        Commands::Config => cmd_config(config),
    });

    if let Err(e) = result {
        match e.downcast_ref::<WrappedError>() {
            Some(wrapped) => eprintln!("Error: {}", wrapped.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<WrappedConfig> {
    let config = match path {
        Some(path) => WrappedConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WrappedConfig::load(),
    };
    config.validate()?;
    pbj_wrapped::config::set_global_config(config.clone());
    Ok(config)
}

/// Load the dataset with a collecting observer, so diagnostics can be listed
fn load_dataset(args: &DataArgs, observer: Arc<CollectingObserver>) -> Result<WrappedDataset> {
    let dataset = DatasetBuilder::from_directory(&args.data_dir, args.quarter, args.prior)?
        .observer(observer.clone())
        .build()?;
    dataset.report_missing_optional(observer.as_ref());
    Ok(dataset)
}

fn print_diagnostics(observer: &CollectingObserver) -> Result<()> {
    let diagnostics = observer.diagnostics();
    eprintln!("{} diagnostics", diagnostics.len());
    for diagnostic in diagnostics {
        eprintln!("{}", serde_json::to_string(&diagnostic)?);
    }
    Ok(())
}

fn cmd_summary(args: SummaryArgs, config: WrappedConfig) -> Result<()> {
    let scope = resolve_identifier(&args.identifier)?;
    let observer = Arc::new(CollectingObserver::new());
    let dataset = load_dataset(&args.data, observer.clone())?;

    let engine = WrappedEngine::new(&dataset)
        .with_config(config)
        .with_observer(observer.clone());
    let summary = engine.summarize_scope(scope)?;
    tracing::debug!(
        scope = %scope,
        facilities = summary.basics.facility_count,
        has_prior_data = summary.trends.has_prior_data,
        diagnostics = observer.diagnostics().len(),
        "scope summarized"
    );

    match args.output {
        Some(path) => {
            export_summaries(std::slice::from_ref(&summary), &path, ExportFormat::Json)?;
            println!("Wrote {} summary to {}", summary.identity.display_name, path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    if args.data.diagnostics {
        print_diagnostics(&observer)?;
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs, config: WrappedConfig) -> Result<()> {
    let format = args.format.map(ExportFormat::from).unwrap_or(config.default_export_format);
    let observer = Arc::new(CollectingObserver::new());
    let dataset = load_dataset(&args.data, observer.clone())?;

    let engine = WrappedEngine::new(&dataset)
        .with_config(config)
        .with_observer(observer.clone());

    let mut summaries = Vec::new();
    let mut failures = 0usize;
    for (scope, result) in engine.summarize_all() {
        match result {
            Ok(summary) => {
                tracing::debug!(scope = %scope, facilities = summary.basics.facility_count, "scope summarized");
                summaries.push(summary)
            }
            Err(e) => {
                failures += 1;
                eprintln!("Skipping {}: {}", scope, e);
            }
        }
    }

    export_summaries(&summaries, &args.output, format)?;
    println!(
        "Exported {} summaries as {} to {} ({} skipped)",
        summaries.len(),
        format,
        args.output.display(),
        failures
    );

    if args.data.diagnostics {
        print_diagnostics(&observer)?;
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let scope = resolve_identifier(&args.identifier)?;
    println!("Scope type:    {}", scope.scope_type());
    println!("Canonical key: {}", scope.canonical_key());
    println!("Display name:  {}", scope.display_name());
    if let Scope::Region(region) = scope {
        let membership = RegionMembership::standard();
        let members: Vec<String> = membership
            .members(region)
            .map(|states| states.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        println!("Members:       {}", members.join(", "));
    }
    Ok(())
}

fn cmd_config(config: WrappedConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
    print!("{}", rendered);
    if let Some(path) = WrappedConfig::default_config_path() {
        eprintln!("# default config path: {}", path.display());
    }
    Ok(())
}
