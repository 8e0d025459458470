use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult};

/// Configuration for a keyword scan.
///
/// # Configuration Locations
///
/// Values are layered from these sources, later ones overriding earlier ones:
/// 1. Global `$HOME/.config/keyscan/config.yaml`
/// 2. Local `.keyscan.yaml` in the current directory
/// 3. Custom config file specified via `--config` flag (must exist)
///
/// # Configuration Format
///
/// ```yaml
/// # Literal, case-sensitive keywords
/// keywords: ["error", "warning", "critical"]
///
/// # Directory whose files are scanned
/// root_path: "./test_files"
///
/// # Extensions of files to scan
/// file_extensions: ["txt"]
///
/// # Glob patterns to skip
/// ignore_patterns: ["**/*.tmp"]
///
/// # Descend into subdirectories
/// recursive: false
///
/// # Maximum number of workers per strategy
/// pool_size: 4
///
/// # Strategies to run and compare, in order
/// strategies: ["threads", "processes"]
///
/// # How to handle invalid UTF-8 (failfast|lossy)
/// encoding_mode: "failfast"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
///
/// Command-line arguments take precedence over file values, see [`ScanConfig::merge_with_cli`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Keywords to look for
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Directory to scan
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// File extensions to include (e.g., ["txt", "log"]).
    /// If None, every non-binary file is included
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Option<Vec<String>>,

    /// Patterns to ignore (glob syntax)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether to walk subdirectories of `root_path`
    #[serde(default)]
    pub recursive: bool,

    /// Upper bound on workers launched per run
    #[serde(default = "default_pool_size")]
    pub pool_size: NonZeroUsize,

    /// Execution strategies to run, in order
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,

    /// How to treat files that are not valid UTF-8
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How file contents that are not valid UTF-8 are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Treat invalid UTF-8 as a per-file error
    #[default]
    FailFast,
    /// Replace invalid sequences and keep scanning
    Lossy,
}

/// Concurrency model used to run workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Workers are threads sharing the host address space
    Threads,
    /// Workers are child processes with private address spaces
    Processes,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Threads => write!(f, "threads"),
            StrategyKind::Processes => write!(f, "processes"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threads" | "threading" => Ok(StrategyKind::Threads),
            "processes" | "multiprocessing" => Ok(StrategyKind::Processes),
            other => Err(format!(
                "unknown strategy '{}', expected 'threads' or 'processes'",
                other
            )),
        }
    }
}

/// Values supplied on the command line that override the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_path: Option<PathBuf>,
    pub strategies: Vec<StrategyKind>,
    pub log_level: Option<String>,
}

fn default_keywords() -> Vec<String> {
    vec![
        "error".to_string(),
        "warning".to_string(),
        "critical".to_string(),
    ]
}

fn default_root_path() -> PathBuf {
    PathBuf::from("./test_files")
}

fn default_file_extensions() -> Option<Vec<String>> {
    Some(vec!["txt".to_string()])
}

pub(crate) fn default_pool_size() -> NonZeroUsize {
    NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN)
}

fn default_strategies() -> Vec<StrategyKind> {
    vec![StrategyKind::Threads, StrategyKind::Processes]
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            root_path: default_root_path(),
            file_extensions: default_file_extensions(),
            ignore_patterns: Vec::new(),
            recursive: false,
            pool_size: default_pool_size(),
            strategies: default_strategies(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&Path>) -> ScanResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("keyscan/config.yaml")),
            Some(PathBuf::from(".keyscan.yaml")),
        ];

        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file is required
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| ScanError::config_error(e.to_string()))
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if !cli.strategies.is_empty() {
            self.strategies = cli.strategies;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }
}
