//! Idle and screen-lock detection.
//!
//! Platform probes report errors; [`ActivityOracle`] turns every error into
//! a fail-open default (0 seconds idle, not locked) so the loop keeps running.

mod command;
pub mod linux;
pub mod logind;
pub mod macos;
pub mod windows;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

pub use linux::LinuxProbe;
pub use macos::MacProbe;
#[cfg(windows)]
pub use windows::WindowsProbe;

/// Failures logged before rate limiting kicks in.
const FAILURE_LOG_BURST: u32 = 5;
/// Log every Nth failure after the initial burst.
const FAILURE_LOG_RATE_LIMIT: u32 = 10;

/// Platform-specific idle and lock queries.
#[async_trait]
pub trait IdleProbe: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Time since the last physical input event.
    async fn idle_time(&self) -> Result<Duration>;

    /// Whether the screen is currently locked.
    async fn screen_locked(&self) -> Result<bool>;
}

/// Probe for platforms without idle detection. Every query fails.
#[derive(Debug, Default)]
pub struct UnsupportedProbe;

#[async_trait]
impl IdleProbe for UnsupportedProbe {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    async fn idle_time(&self) -> Result<Duration> {
        anyhow::bail!("Idle detection is not supported on {}", std::env::consts::OS)
    }

    async fn screen_locked(&self) -> Result<bool> {
        anyhow::bail!("Lock detection is not supported on {}", std::env::consts::OS)
    }
}

/// Best-effort idle/lock oracle with fail-open defaults.
pub struct ActivityOracle {
    probe: Box<dyn IdleProbe>,
    failures: AtomicU32,
}

impl ActivityOracle {
    /// Wrap a probe.
    pub fn new(probe: impl IdleProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            failures: AtomicU32::new(0),
        }
    }

    /// Pick the probe for the current platform.
    pub async fn detect() -> Self {
        let oracle = Self::platform_probe().await;
        info!("Using {} idle probe", oracle.probe_name());
        oracle
    }

    #[cfg(target_os = "linux")]
    async fn platform_probe() -> Self {
        Self::new(LinuxProbe::connect().await)
    }

    #[cfg(target_os = "macos")]
    async fn platform_probe() -> Self {
        Self::new(MacProbe)
    }

    #[cfg(windows)]
    async fn platform_probe() -> Self {
        Self::new(WindowsProbe)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    async fn platform_probe() -> Self {
        warn!(
            "No idle detection for {}; idle time will read as 0",
            std::env::consts::OS
        );
        Self::new(UnsupportedProbe)
    }

    pub fn probe_name(&self) -> &'static str {
        self.probe.name()
    }

    /// Seconds since the last physical input, or 0 when unknown.
    pub async fn idle_seconds(&self) -> f64 {
        match self.probe.idle_time().await {
            Ok(idle) => idle.as_secs_f64(),
            Err(e) => {
                self.log_failure("idle time", &e);
                0.0
            }
        }
    }

    /// Whether the screen is locked, or false when unknown.
    pub async fn is_locked(&self) -> bool {
        match self.probe.screen_locked().await {
            Ok(locked) => locked,
            Err(e) => {
                self.log_failure("lock state", &e);
                false
            }
        }
    }

    /// Rate-limit probe failure logging.
    fn log_failure(&self, what: &str, err: &anyhow::Error) {
        let count = self.failures.fetch_add(1, Ordering::Relaxed);
        if count < FAILURE_LOG_BURST || count % FAILURE_LOG_RATE_LIMIT == 0 {
            warn!("Failed to query {}: {:#}", what, err);
            if count + 1 == FAILURE_LOG_BURST {
                warn!(
                    "Rate-limiting probe errors (showing every {}th error)",
                    FAILURE_LOG_RATE_LIMIT
                );
            }
        } else {
            debug!("Failed to query {}: {:#}", what, err);
        }
    }

    #[cfg(test)]
    fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        idle: Duration,
        locked: bool,
    }

    #[async_trait]
    impl IdleProbe for FixedProbe {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn idle_time(&self) -> Result<Duration> {
            Ok(self.idle)
        }

        async fn screen_locked(&self) -> Result<bool> {
            Ok(self.locked)
        }
    }

    #[tokio::test]
    async fn test_oracle_passes_through_readings() {
        let oracle = ActivityOracle::new(FixedProbe {
            idle: Duration::from_millis(45_500),
            locked: true,
        });

        assert!((oracle.idle_seconds().await - 45.5).abs() < f64::EPSILON);
        assert!(oracle.is_locked().await);
        assert_eq!(oracle.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_oracle_fails_open() {
        let oracle = ActivityOracle::new(UnsupportedProbe);

        assert!(oracle.idle_seconds().await.abs() < f64::EPSILON);
        assert!(!oracle.is_locked().await);
        assert_eq!(oracle.failure_count(), 2);
        assert_eq!(oracle.probe_name(), "unsupported");
    }
}
