use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use keyscan::{
    collect_files,
    config::{CliOverrides, ScanConfig, StrategyKind},
    scan::{worker, Coordinator, KeywordSet, ProcessStrategy, ThreadStrategy},
    RunReport,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct ScanArgs {
    /// Directory whose files are scanned (default: ./test_files)
    root: Option<PathBuf>,

    /// Configuration file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Strategy to run (threads|processes); repeat to run several
    #[arg(short, long = "strategy")]
    strategies: Vec<StrategyKind>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory for keywords with each strategy and compare timings
    Scan(ScanArgs),

    /// Serve one worker request on stdin/stdout (used by the process strategy)
    #[command(hide = true)]
    Worker {
        /// Log level for diagnostics written to stderr
        #[arg(long, default_value = "warn")]
        log_level: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(args),
        Commands::Worker { log_level } => {
            init_tracing(&log_level);
            worker::serve(io::stdin().lock(), io::stdout().lock())
                .context("worker failed to serve request")
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let config = ScanConfig::load_from(args.config.as_deref())
        .context("failed to load configuration")?
        .merge_with_cli(CliOverrides {
            root_path: args.root,
            strategies: args.strategies,
            log_level: args.log_level,
        });
    init_tracing(&config.log_level);

    let keywords = KeywordSet::new(config.keywords.clone())?;
    let files = collect_files(&config)
        .with_context(|| format!("cannot scan {}", config.root_path.display()))?;
    if files.is_empty() {
        warn!(
            "No eligible files found in {}",
            config.root_path.display()
        );
    }

    let coordinator = Coordinator::from_config(&config);
    let mut reports = Vec::with_capacity(config.strategies.len());
    for kind in &config.strategies {
        println!("Starting {} version...", kind);
        let report = match kind {
            StrategyKind::Threads => coordinator.run(&ThreadStrategy::new(), &files, &keywords),
            StrategyKind::Processes => {
                let strategy = ProcessStrategy::current_exe()?
                    .arg("--log-level")
                    .arg(&config.log_level);
                coordinator.run(&strategy, &files, &keywords)
            }
        }
        .with_context(|| format!("{} run failed", kind))?;
        reports.push(report);
    }

    for report in &reports {
        print_report(report, &config.root_path);
    }
    print_agreement(&reports);
    Ok(())
}

fn print_report(report: &RunReport, root: &Path) {
    println!(
        "\n{}",
        format!("Results ({}):", report.strategy).bold()
    );
    if report.matches.is_empty() {
        println!("  no keywords found");
    }
    for (keyword, paths) in report.matches.iter() {
        let listed: Vec<String> = paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap_or(p.as_path()).display().to_string())
            .collect();
        println!("  {}: {}", keyword.green(), listed.join(", ").blue());
    }
    println!(
        "Scanned {} files ({} unreadable) with {} workers",
        report.stats.files_seen(),
        report.stats.files_failed,
        report.workers
    );
    println!("Execution time: {} seconds", report.elapsed_display());
}

fn print_agreement(reports: &[RunReport]) {
    let Some((first, rest)) = reports.split_first() else {
        return;
    };
    if rest.is_empty() {
        return;
    }

    let baseline = first.matches.pairs();
    if rest.iter().all(|r| r.matches.pairs() == baseline) {
        println!("\n{}", "All strategies found the same matches".green());
    } else {
        warn!("Strategies disagree on matched files");
        println!("\n{}", "Strategies found different matches".red());
    }
}
