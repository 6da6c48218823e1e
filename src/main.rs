use anyhow::{Context, Result};
use clap::Parser;
use classic_monitor::error::ClassicError;
use classic_monitor::logging::{LogContext, get_logger_with_context, init_logging};
use classic_monitor::snapshot::{parse_snapshot, read_snapshot_file};
use classic_monitor::{Config, Registry, SnapshotEvaluator, SnapshotReport};
use chrono_tz::Tz;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, error, info};

/// Decode Midnite Classic register snapshots into JSON
#[derive(Parser, Debug)]
#[command(author, version = env!("APP_VERSION"), about)]
struct Args {
    /// Configuration file (defaults to the first of the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot file written by the acquisition daemon
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// YAML datapoint table replacing the built-in one
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Re-decode the data file every N milliseconds
    #[arg(long, value_name = "MS")]
    watch: Option<u64>,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,

    /// Print the active datapoint table as YAML and exit
    #[arg(long)]
    dump_registry: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load()?,
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    init_logging(&config.logging)?;
    info!("classic-monitor {} starting", env!("APP_VERSION"));

    let registry = match &config.registry_file {
        Some(path) => Arc::new(Registry::from_file(path)?),
        None => Registry::builtin()?,
    };

    if args.dump_registry {
        print!("{}", registry.to_yaml()?);
        return Ok(());
    }

    let evaluator = SnapshotEvaluator::new(registry);
    let tz = config.tz()?;

    if config.watch_interval_ms == 0 {
        let snapshot = read_snapshot_file(&config.data_file, tz)?;
        let report = evaluator.evaluate(&snapshot);
        println!("{}", report.to_json(config.output.pretty)?);
        return Ok(());
    }

    watch(&config, evaluator, tz, shutdown_signal()).await
}

/// Resolves on SIGINT; if the handler cannot be installed it never resolves
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(path) = &args.data_file {
        config.data_file = path.clone();
    }
    if let Some(path) = &args.registry {
        config.registry_file = Some(path.clone());
    }
    if let Some(ms) = args.watch {
        config.watch_interval_ms = ms;
    }
    if args.compact {
        config.output.pretty = false;
    }
}

/// Re-decode the data file on every tick until `shutdown` resolves
async fn watch<F>(
    config: &Config,
    evaluator: SnapshotEvaluator,
    tz: Tz,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let logger = get_logger_with_context(
        LogContext::new("watch")
            .with_source(&config.data_file.display().to_string())
            .with_field("interval_ms", config.watch_interval_ms.to_string()),
    );
    let budget = Duration::from_millis(config.evaluation_timeout_ms);
    let mut ticker = interval(Duration::from_millis(config.watch_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Polled across iterations so a signal during a decode is not dropped
    tokio::pin!(shutdown);

    logger.info("Watching data file");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match decode_once(config, &evaluator, tz, budget).await {
                    Ok(report) => {
                        debug!("Decoded snapshot with {} failed datapoints", report.failures().len());
                        println!("{}", report.to_json(config.output.pretty)?);
                    }
                    Err(e) => logger.error(&format!("Snapshot skipped: {}", e)),
                }
            }
            _ = &mut shutdown => {
                logger.info("Interrupted, shutting down");
                break;
            }
        }
    }
    Ok(())
}

async fn decode_once(
    config: &Config,
    evaluator: &SnapshotEvaluator,
    tz: Tz,
    budget: Duration,
) -> classic_monitor::Result<SnapshotReport> {
    let text = tokio::fs::read_to_string(&config.data_file)
        .await
        .map_err(|e| {
            ClassicError::io(format!(
                "Failed to read data file {}: {}",
                config.data_file.display(),
                e
            ))
        })?;

    let evaluator = evaluator.clone();
    let task = tokio::task::spawn_blocking(move || {
        let snapshot = parse_snapshot(&text, tz)?;
        Ok::<_, ClassicError>(evaluator.evaluate(&snapshot))
    });

    match timeout(budget, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            error!("Evaluation task failed: {}", join_err);
            Err(ClassicError::generic(join_err.to_string()))
        }
        Err(_) => Err(ClassicError::timeout(format!(
            "evaluation exceeded {} ms",
            budget.as_millis()
        ))),
    }
}
