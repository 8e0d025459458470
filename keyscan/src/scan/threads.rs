use crossbeam_channel::Sender;
use std::thread::{self, JoinHandle};
use tracing::warn;

use super::coordinator::{ExecutionStrategy, WorkerJob};
use super::worker::run_chunk;
use crate::config::StrategyKind;
use crate::errors::{ScanError, ScanResult};
use crate::results::PartialResult;

/// Runs each worker on its own OS thread, sharing the file list and keywords
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadStrategy;

impl ThreadStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// A running thread worker
#[derive(Debug)]
pub struct ThreadHandle {
    worker_id: usize,
    handle: JoinHandle<()>,
}

impl ExecutionStrategy for ThreadStrategy {
    type Handle = ThreadHandle;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Threads
    }

    fn launch(&self, job: WorkerJob, output: Sender<PartialResult>) -> ScanResult<ThreadHandle> {
        let worker_id = job.worker_id;
        let handle = thread::Builder::new()
            .name(format!("keyscan-worker-{}", worker_id))
            .spawn(move || {
                let partial =
                    run_chunk(job.worker_id, job.paths(), &job.keywords, job.encoding_mode);
                if output.send(partial).is_err() {
                    warn!("Worker {}: output channel closed", job.worker_id);
                }
            })
            .map_err(|e| ScanError::worker_spawn(worker_id, e))?;

        Ok(ThreadHandle { worker_id, handle })
    }

    fn join(&self, handle: ThreadHandle) -> ScanResult<()> {
        handle.handle.join().map_err(|panic| {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "thread panicked".to_string());
            ScanError::worker_failed(handle.worker_id, reason)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingMode;
    use crate::scan::{Coordinator, KeywordSet};
    use std::collections::BTreeSet;
    use std::num::NonZeroUsize;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_thread_run_matches_scenario() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = [
            ("a.txt", "error here"),
            ("b.txt", "all clear"),
            ("c.txt", "warning: critical"),
        ]
        .iter()
        .map(|(name, body)| {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            path
        })
        .collect();
        let keywords = KeywordSet::new(vec![
            "error".to_string(),
            "warning".to_string(),
            "critical".to_string(),
        ])
        .unwrap();

        let coordinator = Coordinator::new(NonZeroUsize::new(4).unwrap(), EncodingMode::FailFast);
        let report = coordinator
            .run(&ThreadStrategy::new(), &files, &keywords)
            .unwrap();

        let expected: BTreeSet<(String, PathBuf)> = [
            ("critical".to_string(), files[2].clone()),
            ("error".to_string(), files[0].clone()),
            ("warning".to_string(), files[2].clone()),
        ]
        .into_iter()
        .collect();
        assert_eq!(report.matches.pairs(), expected);
        assert_eq!(report.workers, 3);
        assert_eq!(report.strategy, StrategyKind::Threads);
    }

    #[test]
    fn test_panicking_thread_is_reported() {
        let strategy = ThreadStrategy::new();
        let handle = ThreadHandle {
            worker_id: 5,
            handle: thread::spawn(|| panic!("boom")),
        };

        let err = strategy.join(handle).unwrap_err();
        match err {
            ScanError::WorkerFailed { worker, reason } => {
                assert_eq!(worker, 5);
                assert_eq!(reason, "boom");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
