/// Error types for keyscan.
///
/// Errors fall into three tiers, and the tier decides who handles them:
///
/// 1. **Per-file** (`FileNotFound`, `PermissionDenied`, `Io`, `Encoding`): raised by the
///    scanner, logged by the worker that owns the file, and never propagated further.
///    The file simply contributes no matches.
/// 2. **Per-worker** (`WorkerSpawn`, `WorkerFailed`, `MissingResults`): an execution unit
///    died or never delivered its partial result. These abort the run.
/// 3. **Pre-run** (`DirectoryNotFound`, `NotADirectory`, `InvalidKeywords`, `ConfigError`):
///    detected before any worker is launched.
///
/// ```rust,ignore
/// match coordinator.run(&ThreadStrategy::new(), &files, &keywords) {
///     Ok(report) => // print report,
///     Err(ScanError::WorkerFailed { worker, reason }) => // a worker crashed,
///     Err(e) => // other run-level failure
/// }
/// ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while scanning
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::str::Utf8Error,
    },
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Invalid keywords: {0}")]
    InvalidKeywords(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Failed to launch worker {worker}: {source}")]
    WorkerSpawn {
        worker: usize,
        source: std::io::Error,
    },
    #[error("Worker {worker} failed: {reason}")]
    WorkerFailed { worker: usize, reason: String },
    #[error("Expected {expected} partial results but received {received}")]
    MissingResults { expected: usize, received: usize },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ScanError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound(path.into())
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn invalid_keywords(msg: impl Into<String>) -> Self {
        Self::InvalidKeywords(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn worker_spawn(worker: usize, source: std::io::Error) -> Self {
        Self::WorkerSpawn { worker, source }
    }

    pub fn worker_failed(worker: usize, reason: impl Into<String>) -> Self {
        Self::WorkerFailed {
            worker,
            reason: reason.into(),
        }
    }

    pub fn missing_results(expected: usize, received: usize) -> Self {
        Self::MissingResults { expected, received }
    }

    /// Maps an I/O error raised while opening `path` onto the file-level variants
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let path = Path::new("test.txt");
        let err = ScanError::file_not_found(path);
        assert!(matches!(err, ScanError::FileNotFound(_)));

        let err = ScanError::permission_denied(path);
        assert!(matches!(err, ScanError::PermissionDenied(_)));

        let err = ScanError::worker_failed(2, "exit status: 1");
        assert!(matches!(err, ScanError::WorkerFailed { worker: 2, .. }));

        let err = ScanError::missing_results(4, 3);
        assert!(matches!(
            err,
            ScanError::MissingResults {
                expected: 4,
                received: 3
            }
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = ScanError::missing_results(4, 3);
        assert_eq!(
            err.to_string(),
            "Expected 4 partial results but received 3"
        );

        let err = ScanError::worker_failed(1, "thread panicked");
        assert_eq!(err.to_string(), "Worker 1 failed: thread panicked");

        let err = ScanError::directory_not_found("missing");
        assert_eq!(err.to_string(), "Directory not found: missing");

        let err = ScanError::config_error("pool_size must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: pool_size must be positive"
        );
    }

    #[test]
    fn test_from_io_maps_kinds() {
        let path = Path::new("a.txt");
        let err = ScanError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ScanError::FileNotFound(_)));

        let err = ScanError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ScanError::PermissionDenied(_)));

        let err = ScanError::from_io(path, io::Error::from(io::ErrorKind::Interrupted));
        assert!(matches!(err, ScanError::IoError(_)));
    }
}
