use crossbeam_channel::{unbounded, Receiver, Sender};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::partition::{partition, Chunk};
use super::KeywordSet;
use crate::config::{EncodingMode, ScanConfig, StrategyKind};
use crate::errors::{ScanError, ScanResult};
use crate::results::{PartialResult, RunReport};

/// Everything one worker needs to scan its chunk.
///
/// The file list and keywords are shared read-only; a strategy that needs a private copy
/// (such as a child process) makes it at launch.
#[derive(Debug, Clone)]
pub struct WorkerJob {
    pub worker_id: usize,
    pub chunk: Chunk,
    pub files: Arc<[PathBuf]>,
    pub keywords: Arc<KeywordSet>,
    pub encoding_mode: EncodingMode,
}

impl WorkerJob {
    /// The paths assigned to this worker
    pub fn paths(&self) -> &[PathBuf] {
        &self.files[self.chunk.range()]
    }
}

/// A concurrency model the coordinator can run workers under.
///
/// `launch` starts one worker that must send exactly one [`PartialResult`] on `output`
/// before it terminates. `join` blocks until that worker has terminated and reports an
/// error if it ended abnormally.
pub trait ExecutionStrategy {
    type Handle;

    fn kind(&self) -> StrategyKind;

    fn launch(&self, job: WorkerJob, output: Sender<PartialResult>) -> ScanResult<Self::Handle>;

    fn join(&self, handle: Self::Handle) -> ScanResult<()>;
}

/// Drives one run: partition, launch, join, drain, merge
#[derive(Debug, Clone, Copy)]
pub struct Coordinator {
    pool_size: NonZeroUsize,
    encoding_mode: EncodingMode,
}

impl Coordinator {
    pub fn new(pool_size: NonZeroUsize, encoding_mode: EncodingMode) -> Self {
        Self {
            pool_size,
            encoding_mode,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.pool_size, config.encoding_mode)
    }

    /// Scans `files` for `keywords` with one worker per chunk under `strategy`.
    ///
    /// Returns once every worker has been joined and every partial result merged. The
    /// elapsed time covers launching, joining, draining and merging.
    pub fn run<S: ExecutionStrategy>(
        &self,
        strategy: &S,
        files: &[PathBuf],
        keywords: &KeywordSet,
    ) -> ScanResult<RunReport> {
        let kind = strategy.kind();
        info!(
            "Starting {} run over {} files with keywords {:?}",
            kind,
            files.len(),
            keywords.as_slice()
        );

        let chunks = partition(files, self.pool_size);
        debug!("{}: partitioned into {} chunks", kind, chunks.len());
        if chunks.is_empty() {
            debug!("{}: no files, no workers launched", kind);
            return Ok(RunReport::empty(kind));
        }

        let start = Instant::now();
        let shared_files: Arc<[PathBuf]> = files.into();
        let shared_keywords = Arc::new(keywords.clone());
        let (tx, rx) = unbounded();

        let mut handles = Vec::with_capacity(chunks.len());
        let mut launch_error = None;
        for (worker_id, chunk) in chunks.iter().enumerate() {
            let job = WorkerJob {
                worker_id,
                chunk: *chunk,
                files: Arc::clone(&shared_files),
                keywords: Arc::clone(&shared_keywords),
                encoding_mode: self.encoding_mode,
            };
            debug!("{}: launching worker {} on {:?}", kind, worker_id, chunk.range());
            match strategy.launch(job, tx.clone()) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    launch_error = Some(e);
                    break;
                }
            }
        }
        drop(tx);
        let launched = handles.len();
        debug!("{}: {} workers running", kind, launched);

        // Full barrier: every launched worker is joined, even after a failure
        let mut first_failure = launch_error;
        for handle in handles {
            if let Err(e) = strategy.join(handle) {
                warn!("{}: {}", kind, e);
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
        if let Some(e) = first_failure {
            return Err(e);
        }
        debug!("{}: all workers joined, draining", kind);

        let mut report = drain(&rx, launched, kind)?;
        report.elapsed = start.elapsed();
        debug!(
            "{}: done in {}",
            kind,
            humantime::format_duration(report.elapsed)
        );
        report.stats.log_stats();
        info!(
            "{} run complete. {} keywords matched across {} entries",
            kind,
            report.matches.len(),
            report.matches.total_entries()
        );

        Ok(report)
    }
}

/// Folds every queued partial result into one report, checking none went missing
fn drain(
    rx: &Receiver<PartialResult>,
    expected: usize,
    kind: StrategyKind,
) -> ScanResult<RunReport> {
    let mut report = RunReport::empty(kind);
    let mut received = 0;

    for partial in rx.try_iter() {
        received += 1;
        report.stats += partial.stats;
        report.matches.merge(partial.matches);
    }
    debug!("{}: merged {} partial results", kind, received);

    if received != expected {
        return Err(ScanError::missing_results(expected, received));
    }

    report.workers = received;
    Ok(report)
}
