//! idle-jiggler - Keeps the session awake by nudging the cursor while idle.
//!
//! Moves the mouse in a small circle every interval, but only while the
//! machine is idle and the screen is unlocked.

use anyhow::{Context, Result};
use clap::Parser;
use idle_jiggler::config::{Overrides, Settings};
use idle_jiggler::domain::JiggleConfig;
use idle_jiggler::injector::{CursorInjector, DryRunInjector, EnigoInjector};
use idle_jiggler::jiggle::{Jiggler, StopReason};
use idle_jiggler::oracle::ActivityOracle;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Prevent screen lock with small mouse movements.
///
/// Interval, circle size and idle threshold come from the settings file
/// unless overridden on the command line.
#[derive(Parser, Debug)]
#[command(name = "idle-jiggler")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:
  idle-jiggler                  Use saved settings or default (1m 0s)
  idle-jiggler -m 2 -s 30       2 minutes 30 seconds interval
  idle-jiggler -s 45 --save     45 seconds interval and save settings
  idle-jiggler --load           Load and use saved settings")]
struct Args {
    /// Interval in minutes (default: from saved settings or 1).
    #[arg(short, long)]
    minutes: Option<u64>,

    /// Interval in seconds (default: from saved settings or 0).
    #[arg(short, long)]
    seconds: Option<u64>,

    /// Save current settings for future use.
    #[arg(long)]
    save: bool,

    /// Load and use saved settings (overrides -m and -s).
    #[arg(long)]
    load: bool,

    /// Circle radius in pixels (default: 25).
    #[arg(long)]
    radius: Option<u32>,

    /// Number of steps to complete the circle (default: 20).
    #[arg(long)]
    steps: Option<u32>,

    /// Idle threshold in seconds before moving (default: 30).
    #[arg(long)]
    idle: Option<u64>,

    /// Path to settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log cursor movements instead of performing them.
    #[arg(long)]
    dry_run: bool,

    /// Print idle and lock readings, then exit.
    #[arg(long)]
    probe: bool,

    /// Number of readings to print in probe mode.
    #[arg(long, default_value = "5")]
    probe_count: usize,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            minutes: self.minutes,
            seconds: self.seconds,
            load: self.load,
            circle_radius: self.radius,
            circle_steps: self.steps,
            idle_threshold: self.idle,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level)?;

    info!("idle-jiggler v{} starting", env!("CARGO_PKG_VERSION"));

    // Load settings and layer CLI values on top
    let settings_path = args.config.clone().or_else(Settings::default_path);
    let saved = Settings::load_or_default(settings_path.as_deref());
    let overrides = args.overrides();
    if overrides.uses_saved_interval() {
        info!(
            "Using saved settings: {}m {}s interval",
            saved.interval_minutes, saved.interval_seconds
        );
    }
    let settings = saved.apply(&overrides);
    let config = settings.jiggle_config().context("Invalid settings")?;

    if args.save {
        save_settings(&settings, settings_path.as_deref());
    }

    let oracle = ActivityOracle::detect().await;

    if args.probe {
        return run_probe(&oracle, args.probe_count).await;
    }

    info!(
        "Started with {}m {}s interval, idle threshold {}s",
        settings.interval_minutes, settings.interval_seconds, settings.idle_threshold
    );
    info!("Press Ctrl+C to stop");

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let reason = if args.dry_run {
        info!("Dry-run mode: cursor movements are logged, not performed");
        run_jiggler(config, oracle, DryRunInjector::new(), shutdown).await
    } else {
        let injector = EnigoInjector::new().context("Failed to initialize cursor control")?;
        run_jiggler(config, oracle, injector, shutdown).await
    };

    match reason {
        StopReason::Cancelled => info!("Stopped by user"),
        StopReason::Injector(e) => error!("Movement stopped: {}", e),
    }

    Ok(())
}

/// Initialize logging with the specified level.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("idle_jiggler={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}

/// Persist settings, warning on failure.
fn save_settings(settings: &Settings, path: Option<&std::path::Path>) {
    let Some(path) = path else {
        warn!("Could not save settings: no config directory available");
        return;
    };

    match settings.save(path) {
        Ok(()) => info!(
            "Settings saved to {}: {}m {}s interval",
            path.display(),
            settings.interval_minutes,
            settings.interval_seconds
        ),
        Err(e) => warn!("Could not save settings: {:#}", e),
    }
}

/// Cancel `shutdown` on Ctrl+C.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.cancel(),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });
}

async fn run_jiggler<I: CursorInjector>(
    config: JiggleConfig,
    oracle: ActivityOracle,
    injector: I,
    shutdown: CancellationToken,
) -> StopReason {
    let mut jiggler = Jiggler::new(config, oracle, injector, shutdown);
    jiggler.run().await
}

/// Print oracle readings once a second.
async fn run_probe(oracle: &ActivityOracle, count: usize) -> Result<()> {
    info!(
        "Probing with {} idle probe, {} readings",
        oracle.probe_name(),
        count
    );

    for n in 1..=count {
        let idle = oracle.idle_seconds().await;
        let locked = oracle.is_locked().await;
        println!("[{n}] | idle={idle:.1}s locked={locked}");

        if n < count {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    Ok(())
}
