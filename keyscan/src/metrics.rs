use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use tracing::info;

use crate::scan::scanner::{LARGE_FILE_THRESHOLD, SMALL_FILE_THRESHOLD};

/// Counters collected by a worker while scanning its chunk.
///
/// Stats travel inside each partial result so that process workers, which cannot
/// share counters with the parent, report the same numbers as thread workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files read and searched successfully
    pub files_scanned: u64,
    /// Files skipped because they could not be read or decoded
    pub files_failed: u64,
    /// Bytes read across all successfully scanned files
    pub bytes_read: u64,
    pub small_files: u64,
    pub buffered_files: u64,
    pub mmap_files: u64,
}

impl ScanStats {
    /// Creates an empty set of counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successfully scanned file of `size` bytes
    pub fn record_file(&mut self, size: u64) {
        self.files_scanned += 1;
        self.bytes_read += size;
        if size < SMALL_FILE_THRESHOLD {
            self.small_files += 1;
        } else if size >= LARGE_FILE_THRESHOLD {
            self.mmap_files += 1;
        } else {
            self.buffered_files += 1;
        }
    }

    /// Records a file that could not be scanned
    pub fn record_failure(&mut self) {
        self.files_failed += 1;
    }

    /// Total files handed to workers, readable or not
    pub fn files_seen(&self) -> u64 {
        self.files_scanned + self.files_failed
    }

    /// Logs the counters at info level
    pub fn log_stats(&self) {
        info!(
            "Scan stats:\n\
             Files scanned: {}\n\
             Files failed: {}\n\
             Bytes read: {}\n\
             Files read (small/buffered/mmap): {}/{}/{}",
            self.files_scanned,
            self.files_failed,
            self.bytes_read,
            self.small_files,
            self.buffered_files,
            self.mmap_files
        );
    }
}

impl AddAssign for ScanStats {
    fn add_assign(&mut self, other: Self) {
        self.files_scanned += other.files_scanned;
        self.files_failed += other.files_failed;
        self.bytes_read += other.bytes_read;
        self.small_files += other.small_files;
        self.buffered_files += other.buffered_files;
        self.mmap_files += other.mmap_files;
    }
}
