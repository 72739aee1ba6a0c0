//! Command line interface of the benchmark tool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::level_filters::LevelFilter;
use yansi::Paint;

use crate::config::{Backend, Config};
use crate::controller::{ERROR_THRESHOLD, RunController, RunOutcome};
use crate::observability;
use crate::report::BenchmarkReport;
use crate::session::{InMemorySession, S3Session, SharedSession};

/// Benchmark for S3-compatible object stores.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,

    /// log debug messages
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// log trace messages, including every single request
    #[argh(switch)]
    pub very_verbose: bool,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Performance(PerformanceCommand),
    Version(VersionCommand),
}

/// upload, download and delete random objects and report timings
///
/// Every virtual user repeatedly uploads a new object, downloads it again and deletes it until the
/// duration has elapsed. The run stops early once more than 100 iterations have failed.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "performance")]
struct PerformanceCommand {
    /// number of virtual users working in parallel
    #[argh(option)]
    vus: Option<usize>,

    /// duration of the test in seconds
    #[argh(option)]
    duration: Option<u64>,

    /// size of every object, for example 500KiB or 1.5MB
    #[argh(option)]
    filesize: Option<String>,
}

/// print the version of the benchmark tool
#[derive(Default, Debug, FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCommand {}

/// Bootstrap the runtime and execute the CLI command.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    let command = match args.command {
        Command::Version(VersionCommand {}) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Performance(command) => command,
    };

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(vus) = command.vus {
        config.performance.vus = vus;
    }
    if let Some(duration) = command.duration {
        config.performance.duration = duration;
    }
    if let Some(filesize) = command.filesize {
        config.performance.filesize = filesize;
    }

    let level = if args.very_verbose {
        LevelFilter::TRACE
    } else if args.verbose {
        LevelFilter::DEBUG
    } else {
        config.logging.level
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("s3-tester")
        .enable_all()
        .build()?;
    let _runtime_guard = runtime.enter();

    observability::init_tracing(level);
    tracing::debug!(?config);

    runtime.block_on(performance(config))
}

async fn performance(config: Config) -> Result<()> {
    let run_config = config
        .run_config()
        .context("invalid performance test parameters")?;
    let session = connect(&config)?;

    let bar = ProgressBar::new_spinner()
        .with_style(ProgressStyle::with_template(
            "{spinner} {msg} {pos} iterations {elapsed}",
        )?)
        .with_message("Running performance test:");
    bar.enable_steady_tick(Duration::from_millis(100));

    let report = RunController::new(run_config, session)
        .with_progress(bar)
        .run()
        .await;

    println!();
    println!("{report}");
    print_summary(&report);

    Ok(())
}

fn connect(config: &Config) -> Result<SharedSession> {
    match config.backend {
        Backend::Memory => {
            tracing::info!("Using in-memory object store");
            Ok(Arc::new(InMemorySession::new()))
        }
        Backend::S3 => {
            let session_config = config.s3_session()?;
            tracing::info!(
                "Connecting to S3 host {} with bucket '{}'",
                session_config.endpoint,
                session_config.bucket
            );
            let session = S3Session::new(session_config).context("failed to set up S3 session")?;
            Ok(Arc::new(session))
        }
    }
}

fn print_summary(report: &BenchmarkReport) {
    print!(
        "{} {} iterations in {:.2?}",
        "SUMMARY:".bold().green(),
        report.completed_iterations.bold(),
        report.elapsed,
    );
    if report.error_count > 0 {
        print!(
            ", {}",
            format!("{} ERRORS", report.error_count).bold().red()
        );
    }
    println!();

    if report.outcome == RunOutcome::BreakerTripped {
        println!(
            "{}",
            format!("Stopped early after more than {ERROR_THRESHOLD} errors")
                .bold()
                .red()
        );
    }
}
