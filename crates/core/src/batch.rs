//! Parallel batch conversion engine.
//!
//! The engine fans discovered files out across a bounded pool of workers,
//! routes each file to its conversion path, and aggregates per-file outcomes
//! without losing partial progress. Workers are tokio tasks spawned onto the
//! multi-thread runtime and bounded by a semaphore, so at most `max_workers`
//! conversions run concurrently while completions are collected in whatever
//! order they arrive.

use crate::config::{BatchConfig, BatchSummary, ConversionTask, FailedFile, FileResult};
use crate::converter::DocumentConverter;
use crate::discovery;
use crate::error::{ConvertError, Result};
use crate::progress::{ProgressFn, ProgressState};
use crate::router::TargetFormat;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Collects per-file outcomes as workers finish.
///
/// Workers record concurrently, so the accumulating lists sit behind a lock.
/// Every result is retained; nothing is dropped on later failures.
#[derive(Debug)]
struct Aggregator {
    total: usize,
    state: Mutex<AggregatorState>,
}

#[derive(Debug, Default)]
struct AggregatorState {
    successful: Vec<FileResult>,
    failed: Vec<FailedFile>,
}

impl Aggregator {
    fn new(total: usize) -> Self {
        Self {
            total,
            state: Mutex::new(AggregatorState::default()),
        }
    }

    async fn record_success(&self, result: FileResult) {
        let mut state = self.state.lock().await;
        state.successful.push(result);
    }

    async fn record_failure(&self, failure: FailedFile) {
        let mut state = self.state.lock().await;
        state.failed.push(failure);
    }

    async fn finalize(&self, total_duration: std::time::Duration) -> BatchSummary {
        let mut state = self.state.lock().await;
        BatchSummary {
            total_files: self.total,
            successful: std::mem::take(&mut state.successful),
            failed: std::mem::take(&mut state.failed),
            total_duration,
        }
    }
}

/// Run a set of conversion tasks through a bounded worker pool.
///
/// `runner` performs one task; any error it returns is caught at the task
/// boundary and recorded as a failure without disturbing sibling tasks. The
/// pool drains fully before this returns, and `on_progress` is invoked
/// exactly once per task, under the progress lock, with
/// `(completed, total, file_name)`.
pub async fn run_tasks<F, Fut>(
    tasks: Vec<ConversionTask>,
    max_workers: usize,
    on_progress: Option<Arc<ProgressFn>>,
    runner: F,
) -> Result<BatchSummary>
where
    F: Fn(ConversionTask) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FileResult>> + Send + 'static,
{
    if max_workers == 0 {
        return Err(ConvertError::InvalidConfig(
            "max_workers must be at least 1".to_string(),
        ));
    }

    let total = tasks.len();
    if total == 0 {
        return Ok(BatchSummary::empty());
    }

    let start = Instant::now();
    let runner = Arc::new(runner);
    let semaphore = Arc::new(Semaphore::new(max_workers));
    let progress = Arc::new(ProgressState::new(total));
    let aggregator = Arc::new(Aggregator::new(total));

    let mut join_set = JoinSet::new();
    // Task id -> input, for synthesizing a failure if a worker panics before
    // it could record its own result.
    let mut submitted: HashMap<tokio::task::Id, (PathBuf, String)> = HashMap::new();

    for task in tasks {
        let runner = Arc::clone(&runner);
        let semaphore = Arc::clone(&semaphore);
        let progress = Arc::clone(&progress);
        let aggregator = Arc::clone(&aggregator);
        let on_progress = on_progress.clone();
        let input_path = task.input_path.clone();
        let file_name = task.file_name();
        let bookkeeping = (input_path.clone(), file_name.clone());

        let handle = join_set.spawn(async move {
            let _permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    aggregator
                        .record_failure(FailedFile {
                            input_path,
                            error: "worker pool shut down".to_string(),
                        })
                        .await;
                    progress.complete(&file_name, on_progress.as_ref()).await;
                    return;
                }
            };

            // A cancellation flag check would slot in here, ahead of the
            // conversion call.
            match runner(task).await {
                Ok(result) => aggregator.record_success(result).await,
                Err(e) => {
                    warn!("Failed to convert {:?}: {}", input_path, e);
                    aggregator
                        .record_failure(FailedFile {
                            input_path,
                            error: e.to_string(),
                        })
                        .await;
                }
            }

            progress.complete(&file_name, on_progress.as_ref()).await;
        });

        submitted.insert(handle.id(), bookkeeping);
    }

    while let Some(joined) = join_set.join_next_with_id().await {
        if let Err(join_err) = joined {
            let (input_path, file_name) = submitted
                .get(&join_err.id())
                .cloned()
                .unwrap_or_else(|| (PathBuf::from("unknown"), "unknown".to_string()));
            error!("Conversion task for {:?} panicked: {}", input_path, join_err);
            aggregator
                .record_failure(FailedFile {
                    input_path,
                    error: format!("conversion task panicked: {join_err}"),
                })
                .await;
            progress.complete(&file_name, on_progress.as_ref()).await;
        }
    }

    let summary = aggregator.finalize(start.elapsed()).await;
    debug_assert_eq!(progress.completed().await, total);
    Ok(summary)
}

/// Handles batch conversion with progress tracking and parallel processing.
pub struct BatchProcessor {
    converter: Arc<DocumentConverter>,
    max_workers: usize,
}

impl BatchProcessor {
    /// Create a batch processor over a shared converter.
    pub fn new(converter: Arc<DocumentConverter>, max_workers: usize) -> Result<Self> {
        BatchConfig::with_max_workers(max_workers).validate()?;
        info!("Batch processor initialized with {} workers", max_workers);
        Ok(Self {
            converter,
            max_workers,
        })
    }

    /// Convert all matching files in a directory to the target format.
    ///
    /// Fails with [`ConvertError::DirectoryNotFound`] when `input_dir` is
    /// absent; creates `output_dir` when missing. Zero matches returns an
    /// empty summary.
    pub async fn convert_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        target: TargetFormat,
        patterns: Option<&[String]>,
        recursive: bool,
    ) -> Result<BatchSummary> {
        self.convert_directory_inner(input_dir, output_dir, target, patterns, recursive, None)
            .await
    }

    /// [`Self::convert_directory`] with a progress callback.
    pub async fn convert_directory_with_progress<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        target: TargetFormat,
        patterns: Option<&[String]>,
        recursive: bool,
        on_progress: F,
    ) -> Result<BatchSummary>
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        let callback: Arc<ProgressFn> = Arc::new(on_progress);
        self.convert_directory_inner(
            input_dir,
            output_dir,
            target,
            patterns,
            recursive,
            Some(callback),
        )
        .await
    }

    async fn convert_directory_inner(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        target: TargetFormat,
        patterns: Option<&[String]>,
        recursive: bool,
        on_progress: Option<Arc<ProgressFn>>,
    ) -> Result<BatchSummary> {
        info!(
            "Starting batch conversion: {:?} -> {:?} (target: {})",
            input_dir, output_dir, target
        );

        let files = discovery::discover(input_dir, patterns, recursive)?;

        std::fs::create_dir_all(output_dir).map_err(|e| ConvertError::OutputDirError {
            path: output_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        if files.is_empty() {
            warn!("No files found to process under {:?}", input_dir);
            return Ok(BatchSummary::empty());
        }

        info!("Found {} files to process", files.len());
        let tasks = files
            .into_iter()
            .map(|f| ConversionTask::new(f, output_dir, target))
            .collect();
        self.run(tasks, on_progress).await
    }

    /// Convert an explicit list of files to the target format.
    ///
    /// Files that do not exist are logged and skipped; the summary's total
    /// reflects only existing files.
    pub async fn convert_file_list(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        target: TargetFormat,
    ) -> Result<BatchSummary> {
        self.convert_file_list_inner(files, output_dir, target, None)
            .await
    }

    /// [`Self::convert_file_list`] with a progress callback.
    pub async fn convert_file_list_with_progress<F>(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        target: TargetFormat,
        on_progress: F,
    ) -> Result<BatchSummary>
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        let callback: Arc<ProgressFn> = Arc::new(on_progress);
        self.convert_file_list_inner(files, output_dir, target, Some(callback))
            .await
    }

    async fn convert_file_list_inner(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        target: TargetFormat,
        on_progress: Option<Arc<ProgressFn>>,
    ) -> Result<BatchSummary> {
        std::fs::create_dir_all(output_dir).map_err(|e| ConvertError::OutputDirError {
            path: output_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let (existing, missing): (Vec<&PathBuf>, Vec<&PathBuf>) =
            files.iter().partition(|f| f.exists());
        if !missing.is_empty() {
            warn!("Some files not found, skipping: {:?}", missing);
        }

        info!("Processing {} files", existing.len());
        let tasks = existing
            .into_iter()
            .map(|f| ConversionTask::new(f.clone(), output_dir, target))
            .collect();
        self.run(tasks, on_progress).await
    }

    async fn run(
        &self,
        tasks: Vec<ConversionTask>,
        on_progress: Option<Arc<ProgressFn>>,
    ) -> Result<BatchSummary> {
        let converter = Arc::clone(&self.converter);
        let summary = run_tasks(tasks, self.max_workers, on_progress, move |task| {
            let converter = Arc::clone(&converter);
            async move { converter.convert_file(&task).await }
        })
        .await?;

        info!(
            "Batch processing completed: {} successful, {} failed",
            summary.successful_count(),
            summary.failed_count()
        );
        Ok(summary)
    }
}
