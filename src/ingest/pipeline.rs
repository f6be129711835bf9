use futures::stream::{self, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ConfigError, FailurePolicy, IngestConfig};
use crate::db::{IngestRepository, WriteCounts};
use crate::ingest::aggregator::aggregate_yearly;
use crate::ingest::error::{FileFailure, IngestError};
use crate::ingest::models::{RawReading, YearlyStat};
use crate::ingest::reader::read_station_file;
use crate::ingest::sanitizer::sanitize;
use crate::utils::station_id_from_path;

/// Per-file lifecycle: `Pending -> Read -> Sanitized -> Aggregated -> Written -> Done`.
///
/// A `FileFailure` records the stage that was being entered when the error hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Read,
    Sanitized,
    Aggregated,
    Written,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Read => "read",
            Stage::Sanitized => "sanitized",
            Stage::Aggregated => "aggregated",
            Stage::Written => "written",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A file's readings and stats, ready to be written
#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub site_id: String,
    pub readings: Vec<RawReading>,
    pub stats: Vec<YearlyStat>,
    /// Sentinel values replaced with NULL
    pub values_nulled: usize,
}

/// Result of a file that reached `Done`
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub site_id: String,
    pub readings_parsed: usize,
    pub stats_computed: usize,
    pub counts: WriteCounts,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub enum FileOutcome {
    Done(FileReport),
    Failed(FileFailure),
    /// Never started because an earlier file failed under `FailurePolicy::Abort`
    Skipped(PathBuf),
}

/// Run-level metrics for one pipeline invocation
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files_discovered: usize,
    pub files_ingested: usize,
    pub files_skipped: usize,
    pub failures: Vec<FileFailure>,
    pub readings_parsed: usize,
    pub totals: WriteCounts,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Done(report) => {
                self.files_ingested += 1;
                self.readings_parsed += report.readings_parsed;
                self.totals.add(&report.counts);
            }
            FileOutcome::Failed(failure) => self.failures.push(failure),
            FileOutcome::Skipped(_) => self.files_skipped += 1,
        }
    }

    fn log(&self) {
        if self.has_failures() {
            warn!(
                files_discovered = self.files_discovered,
                files_ingested = self.files_ingested,
                files_failed = self.files_failed(),
                files_skipped = self.files_skipped,
                readings_inserted = self.totals.readings_inserted,
                readings_duplicate = self.totals.readings_duplicate,
                stats_inserted = self.totals.stats_inserted,
                stats_duplicate = self.totals.stats_duplicate,
                elapsed_secs = %format!("{:.2}", self.elapsed.as_secs_f64()),
                "Weather data ingestion finished with failures"
            );
            for failure in &self.failures {
                error!("  {}", failure);
            }
        } else {
            info!(
                files_discovered = self.files_discovered,
                files_ingested = self.files_ingested,
                readings_inserted = self.totals.readings_inserted,
                readings_duplicate = self.totals.readings_duplicate,
                stats_inserted = self.totals.stats_inserted,
                stats_duplicate = self.totals.stats_duplicate,
                elapsed_secs = %format!("{:.2}", self.elapsed.as_secs_f64()),
                "Weather data ingestion complete"
            );
        }
    }
}

/// Drives reader -> sanitizer -> aggregator -> repository for every station file.
///
/// Files run concurrently up to `IngestConfig::concurrency`. Stages within a
/// file are sequential. Each file commits in its own transaction, so a failed
/// file never leaves partial rows behind and re-running the whole pipeline is
/// safe.
#[derive(Clone)]
pub struct IngestPipeline {
    config: IngestConfig,
    repo: IngestRepository,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig, repo: IngestRepository) -> Self {
        Self { config, repo }
    }

    /// Ingest every station file in the configured directory
    pub async fn run(&self) -> Result<RunSummary, ConfigError> {
        self.run_with(|_| {}).await
    }

    /// Same as `run`, calling `on_file` as each file finishes (e.g. to drive a progress bar)
    #[instrument(skip(self, on_file), fields(data_dir = %self.config.data_dir.display()))]
    pub async fn run_with<F>(&self, mut on_file: F) -> Result<RunSummary, ConfigError>
    where
        F: FnMut(&FileOutcome),
    {
        let start_time = Instant::now();
        info!(
            pattern = %self.config.file_pattern(),
            concurrency = self.config.concurrency,
            failure_policy = %self.config.failure_policy,
            "Starting weather data ingestion"
        );

        let files = self.config.discover_files()?;
        info!("Found {} station files", files.len());

        let mut summary = RunSummary {
            files_discovered: files.len(),
            ..Default::default()
        };

        let aborted = AtomicBool::new(false);
        let aborted = &aborted;

        let mut outcomes = stream::iter(files)
            .map(|path| async move {
                if aborted.load(Ordering::SeqCst) {
                    debug!("Skipping {} after earlier failure", path.display());
                    return FileOutcome::Skipped(path);
                }

                match self.ingest_file(&path).await {
                    Ok(report) => FileOutcome::Done(report),
                    Err(failure) => {
                        if self.config.failure_policy == FailurePolicy::Abort {
                            aborted.store(true, Ordering::SeqCst);
                        }
                        FileOutcome::Failed(failure)
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1));

        while let Some(outcome) = outcomes.next().await {
            on_file(&outcome);
            summary.record(outcome);
        }

        summary.elapsed = start_time.elapsed();
        summary.log();
        Ok(summary)
    }

    /// Ingest a single station file as one unit of work
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_file(&self, path: &Path) -> Result<FileReport, FileFailure> {
        let start_time = Instant::now();
        let fail = |stage: Stage, error: IngestError| {
            error!(stage = %stage, error = %error, "Station file failed");
            FileFailure {
                path: path.to_path_buf(),
                stage,
                error,
            }
        };

        let prepared = self
            .prepare_file(path)
            .await
            .map_err(|(stage, e)| fail(stage, e))?;

        let counts = self
            .repo
            .write_file_batch(&prepared.readings, &prepared.stats)
            .await
            .map_err(|e| fail(Stage::Written, e.into()))?;
        debug!(stage = %Stage::Done, site_id = %prepared.site_id, "Batch committed");

        let report = FileReport {
            path: path.to_path_buf(),
            site_id: prepared.site_id,
            readings_parsed: prepared.readings.len(),
            stats_computed: prepared.stats.len(),
            counts,
            elapsed: start_time.elapsed(),
        };

        if report.readings_parsed == 0 {
            info!(site_id = %report.site_id, "Station file contained no readings");
        } else {
            info!(
                site_id = %report.site_id,
                readings_parsed = report.readings_parsed,
                readings_inserted = counts.readings_inserted,
                stats_inserted = counts.stats_inserted,
                elapsed_secs = %format!("{:.2}", report.elapsed.as_secs_f64()),
                "Station file ingested"
            );
        }

        Ok(report)
    }

    /// Read, sanitize and aggregate a file without touching the database.
    ///
    /// On error, returns the stage that failed alongside the cause.
    pub async fn prepare_file(&self, path: &Path) -> Result<PreparedFile, (Stage, IngestError)> {
        let site_id = station_id_from_path(path, &self.config.file_prefix).map_err(|msg| {
            (
                Stage::Read,
                IngestError::InvalidFileName(format!("{}: {msg}", path.display())),
            )
        })?;

        // File I/O and parsing are blocking; keep them off the async workers
        let read_path = path.to_path_buf();
        let read_site = site_id.clone();
        let mut readings =
            tokio::task::spawn_blocking(move || read_station_file(&read_path, &read_site))
                .await
                .map_err(|e| (Stage::Read, IngestError::from(e)))?
                .map_err(|e| (Stage::Read, IngestError::from(e)))?;
        debug!(stage = %Stage::Read, count = readings.len(), "Readings parsed");

        let values_nulled = sanitize(&mut readings);
        debug!(stage = %Stage::Sanitized, values_nulled, "Sentinel values replaced");

        let stats = aggregate_yearly(&readings);
        debug!(stage = %Stage::Aggregated, years = stats.len(), "Yearly stats computed");

        Ok(PreparedFile {
            site_id,
            readings,
            stats,
            values_nulled,
        })
    }
}
