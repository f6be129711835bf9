use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{error, info};

use wx_ingest::config::{FailurePolicy, IngestConfig};
use wx_ingest::db::{self, IngestRepository};
use wx_ingest::ingest::{FileOutcome, IngestPipeline, RunSummary};

#[derive(Parser)]
#[command(name = "wx-ingest")]
#[command(about = "Ingest daily weather station files and their yearly statistics", long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env)]
    database_url: String,

    /// Directory containing station files [env: WX_DATA_DIR, default: wx_data]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Station file name prefix; the file stem becomes the station id [env: WX_FILE_PREFIX, default: USC]
    #[arg(long)]
    prefix: Option<String>,

    /// Station file extension [env: WX_FILE_EXTENSION, default: txt]
    #[arg(long)]
    extension: Option<String>,

    /// Number of files ingested in parallel [env: INGEST_CONCURRENCY, default: 4]
    #[arg(long)]
    parallel: Option<usize>,

    /// What to do after a file fails: 'abort' stops starting new files, 'continue' processes the rest [env: FAILURE_POLICY, default: abort]
    #[arg(long, value_enum)]
    on_failure: Option<FailurePolicy>,

    /// Maximum database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "5")]
    max_connections: u32,

    /// Do not apply schema migrations before ingesting
    #[arg(long)]
    skip_migrations: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Environment first, then command-line flags on top
    let mut config = IngestConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(prefix) = cli.prefix {
        config.file_prefix = prefix;
    }
    if let Some(ext) = cli.extension {
        config.set_file_extension(&ext);
    }
    if let Some(parallel) = cli.parallel {
        config.concurrency = parallel;
    }
    if let Some(policy) = cli.on_failure {
        config.failure_policy = policy;
    }

    // Fail on configuration problems before touching the database
    let file_count = config.discover_files()?.len();
    if file_count == 0 {
        info!("No station files match {}", config.file_pattern());
    }

    let pool = db::connect(&cli.database_url, cli.max_connections).await?;
    if !cli.skip_migrations {
        db::run_migrations(&pool).await?;
    }

    let pipeline = IngestPipeline::new(config, IngestRepository::new(pool));

    let pb = if cli.no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(file_count as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({msg})")?
            .progress_chars("##-"),
    );

    let mut ingested = 0;
    let mut failed = 0;
    let summary = pipeline
        .run_with(|outcome| {
            match outcome {
                FileOutcome::Done(_) => ingested += 1,
                FileOutcome::Failed(_) => failed += 1,
                FileOutcome::Skipped(_) => {}
            }
            pb.set_message(format!("{ingested} ingested, {failed} failed"));
            pb.inc(1);
        })
        .await?;
    pb.finish_with_message(format!("{ingested} ingested, {failed} failed"));

    print_summary(&summary);

    if summary.has_failures() {
        error!("{} station files failed to ingest", summary.files_failed());
        return Err(format!("{} station files failed to ingest", summary.files_failed()).into());
    }

    info!("Ingestion completed successfully!");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", "=".repeat(60));
    println!("Ingestion Summary");
    println!("{}", "=".repeat(60));
    println!("Files Found:         {}", summary.files_discovered);
    println!("Files Ingested:      {}", summary.files_ingested);
    println!("Files Failed:        {}", summary.files_failed());
    println!("Files Skipped:       {}", summary.files_skipped);
    println!("{}", "-".repeat(60));
    println!("Readings Parsed:     {}", summary.readings_parsed);
    println!("Readings Inserted:   {}", summary.totals.readings_inserted);
    println!("Readings Duplicate:  {}", summary.totals.readings_duplicate);
    println!("Yearly Stats Insert: {}", summary.totals.stats_inserted);
    println!("Yearly Stats Dup:    {}", summary.totals.stats_duplicate);
    println!("{}", "-".repeat(60));
    println!("Total Time:          {:.2}s", summary.elapsed.as_secs_f64());
    println!("{}", "=".repeat(60));

    if summary.totals.readings_inserted > 0 && summary.elapsed.as_secs_f64() > 0.0 {
        let rate = summary.totals.readings_inserted as f64 / summary.elapsed.as_secs_f64();
        println!("Insert Rate:         {rate:.0} readings/sec");
    }

    if summary.has_failures() {
        println!("\nFailed Files:");
        for failure in &summary.failures {
            println!("  {failure}");
        }
    }

    println!();
}
