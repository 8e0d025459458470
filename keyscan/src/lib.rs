pub mod config;
pub mod discovery;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod scan;

pub use config::{EncodingMode, ScanConfig, StrategyKind};
pub use discovery::collect_files;
pub use errors::{ScanError, ScanResult};
pub use metrics::ScanStats;
pub use results::{KeywordMatches, PartialResult, RunReport};
pub use scan::{Coordinator, ExecutionStrategy, KeywordSet, ProcessStrategy, ThreadStrategy};
