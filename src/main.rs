use anyhow::{Context, Result};
use arxiv_harvest::config::{
    default_config_path, find_config_file, load_config, save_config, Config, LogFormat,
    LoggingConfig, LOCAL_CONFIG_FILE,
};
use arxiv_harvest::harvest::{plan_topics, run_pipeline, Harvester, RunOptions};
use arxiv_harvest::models::DateRange;
use arxiv_harvest::probe::{link_targets, store_targets, ProbeResult, Prober};
use arxiv_harvest::sources::ArxivClient;
use arxiv_harvest::store::{compact_snapshot, MetadataStore};
use arxiv_harvest::utils::HttpClient;
use clap::{Args, Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// arXiv Harvest - Incrementally collect arXiv metadata into a deduplicated JSON-lines store
#[derive(Parser, Debug)]
#[command(name = "arxiv-harvest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Incrementally collect arXiv metadata into a deduplicated JSON-lines store", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Harvest new papers into the current month's snapshot and write the report
    #[command(alias = "f")]
    Fetch(FetchArgs),

    /// Rewrite a snapshot file keeping the first record per paper id
    Compact {
        /// Snapshot file (default: the current month's snapshot in the metadata directory)
        file: Option<PathBuf>,

        /// Metadata directory (overrides the config file)
        #[arg(long)]
        metadata_dir: Option<PathBuf>,
    },

    /// Check that the bulk-data bucket is reachable
    CheckStore {
        /// File with one URL per line; the first few are probed as well
        #[arg(long)]
        links_file: Option<PathBuf>,

        /// Bucket base URL (overrides the config file)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Destination (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
struct FetchArgs {
    /// Maximum results per topic (default: config value, unbounded with --date-range)
    #[arg(long, short = 'm')]
    max_results: Option<usize>,

    /// Submission date range as START,END (YYYY-MM-DD,YYYY-MM-DD)
    #[arg(long, short = 'd')]
    date_range: Option<String>,

    /// Archive to harvest, e.g. cs or math (can be repeated; default: all main archives)
    #[arg(long, short = 'c')]
    category: Vec<String>,

    /// Ignore snapshot files without a YYYYMM suffix when checking for known papers
    #[arg(long)]
    skip_no_date_files: bool,

    /// Count papers per archive in the report
    #[arg(long)]
    include_category_stats: bool,

    /// Metadata directory (overrides the config file)
    #[arg(long)]
    metadata_dir: Option<PathBuf>,
}

fn init_logging(cli: &Cli, logging: &LoggingConfig) -> Result<()> {
    let level = match cli.verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("arxiv_harvest={}", env_filter)),
    );

    let (text, json) = match logging.format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    let file = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .with(file)
        .init();

    Ok(())
}

fn resolve_config_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(find_config_file)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(&cli);
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration from the environment".to_string(),
    })?;

    init_logging(&cli, &config.logging)?;
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::Fetch(args) => run_fetch(&config, args).await,
        Commands::Compact { file, metadata_dir } => run_compact(&config, file, metadata_dir),
        Commands::CheckStore {
            links_file,
            base_url,
        } => run_check_store(&config, links_file, base_url).await,
        Commands::InitConfig { path, force } => run_init_config(path, force),
    }
}

async fn run_fetch(config: &Config, args: FetchArgs) -> Result<()> {
    let date_range = match args.date_range.as_deref().map(str::parse::<DateRange>) {
        None => None,
        Some(Ok(range)) => Some(range),
        Some(Err(e)) => {
            tracing::error!("Invalid --date-range: {}", e);
            return Ok(());
        }
    };

    let topics = plan_topics(
        date_range,
        &args.category,
        args.max_results,
        config.harvest.default_max_results,
    );

    let metadata_dir = args
        .metadata_dir
        .unwrap_or_else(|| config.harvest.metadata_dir.clone());
    let store = MetadataStore::new(metadata_dir);

    let client = ArxivClient::with_client(HttpClient::new()?, config.harvest.api_url.clone());
    let harvester = Harvester::new(client, config.harvest_settings());

    let options = RunOptions {
        skip_undated: args.skip_no_date_files,
        include_category_stats: args.include_category_stats,
    };
    let outcome = run_pipeline(&harvester, &store, &topics, options)
        .await
        .context("Harvest aborted")?;

    tracing::info!(
        "Done: {} new papers, {} known before, {} known now",
        outcome.summary.new_papers_count,
        outcome.initial_known,
        outcome.known.len()
    );
    if let Some(report) = outcome.report {
        tracing::info!("Report: {}", report.display());
    }
    Ok(())
}

fn run_compact(config: &Config, file: Option<PathBuf>, metadata_dir: Option<PathBuf>) -> Result<()> {
    let path = match file {
        Some(path) => path,
        None => {
            let dir = metadata_dir.unwrap_or_else(|| config.harvest.metadata_dir.clone());
            MetadataStore::new(dir).snapshot_path()
        }
    };

    if !path.exists() {
        anyhow::bail!("{} does not exist", path.display());
    }

    let stats = compact_snapshot(&path).with_context(|| format!("Failed to compact {}", path.display()))?;

    println!("Compacted {}", path.display());
    println!("  Records:    {}", stats.lines);
    println!("  Unique:     {}", stats.unique);
    println!("  Duplicates: {}", stats.duplicates);
    println!("  Malformed:  {}", stats.malformed);
    Ok(())
}

async fn run_check_store(
    config: &Config,
    links_file: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<()> {
    let mut settings = config.probe_settings();
    if let Some(url) = base_url {
        settings.base_url = url;
    }

    let mut targets = store_targets(&settings);
    if let Some(path) = links_file {
        match link_targets(&path, settings.links_sample) {
            Ok(links) => targets.extend(links),
            Err(e) => tracing::warn!("Cannot read links file {}: {}", path.display(), e),
        }
    }

    let prober = Prober::new(settings.timeout)?;
    let results = prober.probe_all(targets).await;
    print_probe_table(&results);
    Ok(())
}

fn run_init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(default_config_path)
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

    save_config(&Config::default(), &path, force)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn print_probe_table(results: &[ProbeResult]) {
    use comfy_table::{Attribute, Cell, Color, Table};
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Target", "URL", "Status", "Bytes"]);

    for result in results {
        let status = match &result.status {
            Ok(code) => Cell::new(code.to_string()),
            Err(e) => Cell::new(format!("error: {}", e)),
        };
        let status = if result.is_reachable() {
            status.fg(Color::Green)
        } else {
            status.fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(&result.target.label).add_attribute(Attribute::Bold),
            Cell::new(&result.target.url),
            status,
            Cell::new(
                result
                    .body_len
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    println!("{table}");
}
