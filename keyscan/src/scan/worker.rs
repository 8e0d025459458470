use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::debug;

use super::scanner::KeywordScanner;
use super::KeywordSet;
use crate::config::EncodingMode;
use crate::errors::ScanResult;
use crate::results::PartialResult;

/// Scans every path of one chunk and folds the per-file matches into a single result.
///
/// Per-file failures are logged and counted by the scanner; they never stop the chunk.
pub fn run_chunk(
    worker_id: usize,
    paths: &[PathBuf],
    keywords: &KeywordSet,
    encoding_mode: EncodingMode,
) -> PartialResult {
    let scanner = KeywordScanner::new(keywords, encoding_mode);
    let mut partial = PartialResult::new(worker_id);

    for path in paths {
        let matches = scanner.scan(path, &mut partial.stats);
        partial.matches.merge(matches);
    }

    debug!(
        "Worker {} scanned {} files ({} failed), {} keyword hits",
        worker_id,
        partial.stats.files_scanned,
        partial.stats.files_failed,
        partial.matches.total_entries()
    );
    partial
}

/// Input handed to a worker running in its own process.
///
/// The request carries private copies of the chunk's paths and the keywords, so the
/// child needs nothing from the parent's memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub worker_id: usize,
    pub paths: Vec<PathBuf>,
    pub keywords: KeywordSet,
    #[serde(default)]
    pub encoding_mode: EncodingMode,
}

impl WorkerRequest {
    pub fn run(&self) -> PartialResult {
        run_chunk(
            self.worker_id,
            &self.paths,
            &self.keywords,
            self.encoding_mode,
        )
    }
}

/// Child-process entry point: reads one [`WorkerRequest`] as JSON from `input`, scans
/// the chunk and writes one [`PartialResult`] as JSON to `output`.
///
/// Logs must go elsewhere (stderr); `output` carries only the result document.
pub fn serve<R: Read, W: Write>(input: R, mut output: W) -> ScanResult<()> {
    let request: WorkerRequest = serde_json::from_reader(input)?;
    debug!(
        "Worker {} received {} paths",
        request.worker_id,
        request.paths.len()
    );

    let partial = request.run();
    serde_json::to_writer(&mut output, &partial)?;
    output.flush()?;
    Ok(())
}
