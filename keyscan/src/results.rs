/// Result types produced by a scan.
///
/// Ownership follows the data flow: a worker builds a [`PartialResult`] privately, moves it
/// into the output channel, and the coordinator folds it into the run's
/// [`KeywordMatches`] with [`KeywordMatches::merge`]. Nothing here is shared mutably, so
/// none of these types need interior locking.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::StrategyKind;
use crate::metrics::ScanStats;

/// Mapping from keyword to the files that contain it.
///
/// Keywords iterate in sorted order. Paths keep insertion order and are never
/// deduplicated: merging the same file twice lists it twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordMatches {
    entries: BTreeMap<String, Vec<PathBuf>>,
}

impl KeywordMatches {
    /// Creates an empty mapping
    pub fn new() -> Self {
        Default::default()
    }

    /// Records that `path` contains `keyword`
    pub fn insert(&mut self, keyword: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries
            .entry(keyword.into())
            .or_default()
            .push(path.into());
    }

    /// Appends every path in `other` to the matching keyword's list.
    ///
    /// Entries are created as needed. Order within `other` is preserved and appended
    /// after the paths already present.
    pub fn merge(&mut self, other: KeywordMatches) {
        for (keyword, paths) in other.entries {
            self.entries.entry(keyword).or_default().extend(paths);
        }
    }

    /// Paths recorded for `keyword`, if any
    pub fn get(&self, keyword: &str) -> Option<&[PathBuf]> {
        self.entries.get(keyword).map(Vec::as_slice)
    }

    /// Iterates keywords in sorted order with their paths
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.entries
            .iter()
            .map(|(keyword, paths)| (keyword.as_str(), paths.as_slice()))
    }

    /// Number of keywords with at least one match
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of (keyword, path) entries, counting duplicates
    pub fn total_entries(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// The result viewed as a set of (keyword, path) pairs, ignoring order and duplicates.
    ///
    /// Two runs over the same input agree when their pair sets are equal, whatever
    /// order their workers finished in.
    pub fn pairs(&self) -> BTreeSet<(String, PathBuf)> {
        self.entries
            .iter()
            .flat_map(|(keyword, paths)| {
                paths
                    .iter()
                    .map(move |path| (keyword.clone(), path.clone()))
            })
            .collect()
    }

    /// True if `path` is recorded under `keyword`
    pub fn contains(&self, keyword: &str, path: &Path) -> bool {
        self.get(keyword)
            .is_some_and(|paths| paths.iter().any(|p| p == path))
    }
}

/// One worker's output, emitted exactly once on the output channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
    /// Index of the worker (and of its chunk)
    pub worker_id: usize,
    /// Keyword matches found in the worker's chunk
    #[serde(default)]
    pub matches: KeywordMatches,
    /// Counters for the worker's chunk
    #[serde(default)]
    pub stats: ScanStats,
}

impl PartialResult {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Default::default()
        }
    }
}

/// Outcome of one coordinator run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Strategy the workers ran under
    pub strategy: StrategyKind,
    /// Merged matches across every worker
    pub matches: KeywordMatches,
    /// Aggregated counters across every worker
    pub stats: ScanStats,
    /// Number of workers launched
    pub workers: usize,
    /// Wall-clock time from first launch to final merge
    pub elapsed: Duration,
}

impl RunReport {
    /// An empty report for a run that launched no workers
    pub fn empty(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            matches: KeywordMatches::new(),
            stats: ScanStats::new(),
            workers: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Elapsed seconds rounded for display, e.g. `0.25`
    pub fn elapsed_display(&self) -> String {
        format!("{:.2}", self.elapsed.as_secs_f64())
    }
}
