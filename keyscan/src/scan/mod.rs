//! Parallel keyword scanning.
//!
//! A run moves through these pieces in order:
//!
//! 1. [`partition`] splits the file list into contiguous [`Chunk`]s, one per worker.
//! 2. A [`Coordinator`] launches one worker per chunk through an [`ExecutionStrategy`]:
//!    [`ThreadStrategy`] for workers sharing this address space, or [`ProcessStrategy`]
//!    for child processes that each get a private copy of their inputs.
//! 3. Each worker runs [`worker::run_chunk`], calling the [`KeywordScanner`] per file, and
//!    sends exactly one [`PartialResult`](crate::results::PartialResult) to the output
//!    channel.
//! 4. After every worker has been joined, the coordinator drains the channel and merges
//!    the partial results into the run's report.
//!
//! ```rust,ignore
//! let keywords = KeywordSet::new(vec!["error".into(), "warning".into()])?;
//! let coordinator = Coordinator::new(pool_size, EncodingMode::FailFast);
//! let report = coordinator.run(&ThreadStrategy::new(), &files, &keywords)?;
//! ```
pub mod coordinator;
pub mod partition;
pub mod process;
pub mod scanner;
pub mod threads;
pub mod worker;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{ScanError, ScanResult};

pub use coordinator::{Coordinator, ExecutionStrategy, WorkerJob};
pub use partition::{partition, Chunk};
pub use process::ProcessStrategy;
pub use scanner::KeywordScanner;
pub use threads::ThreadStrategy;

/// Ordered, duplicate-free, non-empty list of literal keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Builds a keyword set, dropping repeated keywords after their first occurrence.
    ///
    /// Fails when no keywords are given or when any keyword is empty, since the empty
    /// string is contained in every file.
    pub fn new(keywords: Vec<String>) -> ScanResult<Self> {
        if keywords.is_empty() {
            return Err(ScanError::invalid_keywords("at least one keyword is required"));
        }
        if keywords.iter().any(String::is_empty) {
            return Err(ScanError::invalid_keywords("keywords must not be empty"));
        }

        let mut unique: Vec<String> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            if unique.contains(&keyword) {
                warn!("Ignoring duplicate keyword: {}", keyword);
            } else {
                unique.push(keyword);
            }
        }

        Ok(Self { keywords: unique })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }
}

impl TryFrom<Vec<String>> for KeywordSet {
    type Error = ScanError;

    fn try_from(keywords: Vec<String>) -> ScanResult<Self> {
        Self::new(keywords)
    }
}

impl From<KeywordSet> for Vec<String> {
    fn from(set: KeywordSet) -> Self {
        set.keywords
    }
}
