//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use jobwatch_core::{Pipeline, PipelineConfig, ProgressReporter, RunReport};
use jobwatch_crawler::HttpFetcher;
use jobwatch_salary::SalaryNormalizer;
use jobwatch_shared::{AppConfig, JobPosting, init_config, load_config, load_config_from};
use jobwatch_storage::{JobStore, Storage};

use crate::server::{self, JobPipeline};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// jobwatch: track job postings and what they pay.
#[derive(Parser)]
#[command(
    name = "jobwatch",
    version,
    about = "Scrape a job board, normalize salaries, and keep a reconciled local copy.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.jobwatch/jobwatch.toml.
    #[arg(long, env = "JOBWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the pipeline once and print the stored postings.
    Scrape {
        /// Print the posting list as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Serve the posting list over HTTP.
    Serve {
        /// Address to bind (defaults to `[server].bind`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print stored postings without scraping.
    List {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how a salary string normalizes.
    Salary {
        /// Raw salary text, e.g. "2.000,00 do 3.000,00 EUR".
        text: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "jobwatch=info,tower_http=info",
        1 => "jobwatch=debug,tower_http=debug",
        _ => "jobwatch=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Scrape { json } => cmd_scrape(config_path, json).await,
        Command::Serve { bind } => cmd_serve(config_path, bind).await,
        Command::List { json } => cmd_list(config_path, json).await,
        Command::Salary { text } => cmd_salary(config_path, &text),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let path = Path::new(&config.storage.db_path);
    info!(path = %path.display(), "opening posting store");
    Ok(Storage::open(path).await?)
}

async fn build_pipeline(config: &AppConfig) -> Result<JobPipeline> {
    let pipeline_config = PipelineConfig::from_app(config)?;
    let fetcher = Arc::new(HttpFetcher::new(&pipeline_config.fetch)?);
    let store = Arc::new(open_storage(config).await?);
    Ok(Pipeline::new(fetcher, store, pipeline_config))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = resolve_config(config_path)?;
    let pipeline = build_pipeline(&config).await?;

    info!(listing = %pipeline.config().site.listing_url, "starting scrape");

    let reporter = CliProgress::new();
    let report = pipeline.run(&reporter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.postings)?);
        return Ok(());
    }

    println!();
    println!("  Scrape complete");
    println!("  Listed:    {}", report.scraped);
    println!("  Added:     {}", report.inserted);
    println!("  Removed:   {}", report.deleted);
    println!("  No salary: {}", report.enrichment_failures);
    println!("  Stored:    {}", report.postings.len());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_serve(config_path: Option<&Path>, bind: Option<String>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let pipeline = Arc::new(build_pipeline(&config).await?);

    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let refresh = (config.server.refresh_interval_secs > 0)
        .then(|| Duration::from_secs(config.server.refresh_interval_secs));

    info!(%addr, refresh_secs = config.server.refresh_interval_secs, "starting server");
    server::serve(pipeline, &addr, refresh).await
}

async fn cmd_list(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = open_storage(&config).await?;
    let postings = storage.get_all().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&postings)?);
        return Ok(());
    }

    if postings.is_empty() {
        println!("No stored postings. Run `jobwatch scrape` first.");
        return Ok(());
    }

    for posting in &postings {
        println!("{}", format_row(posting));
    }
    println!("\n{} posting(s)", postings.len());
    Ok(())
}

fn format_row(posting: &JobPosting) -> String {
    let monthly = posting
        .normalized_monthly
        .map(|m| format!("{m:>9.0} EUR/mo"))
        .unwrap_or_else(|| format!("{:>16}", "-"));
    format!(
        "{}  {monthly}  {} | {}",
        posting.posted_at, posting.title, posting.company
    )
}

fn cmd_salary(config_path: Option<&Path>, text: &str) -> Result<()> {
    let config = resolve_config(config_path)?;
    let normalizer = SalaryNormalizer::new(config.salary)?;
    let estimate = normalizer.estimate(Some(text));

    let show = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into());
    println!("  Input:   {text}");
    println!("  Monthly: {}", show(estimate.monthly));
    println!("  Yearly:  {}", show(estimate.yearly));
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid progress template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn detail_fetched(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching details [{current}/{total}] {url}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
