//! Linux idle and lock probe.
//!
//! Idle time: `xprintidle` (X11), falling back to logind idle hints.
//! Lock state: logind `LockedHint`, falling back to `gnome-screensaver-command -q`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::IdleProbe;
use super::command::run_probe;
use super::logind::LogindSession;

/// Linux probe combining X11 tools and systemd-logind.
pub struct LinuxProbe {
    logind: Option<LogindSession>,
}

impl LinuxProbe {
    /// Build the probe, connecting to logind when available.
    pub async fn connect() -> Self {
        let logind = match LogindSession::connect().await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(
                    "logind unavailable ({:#}); relying on xprintidle and gnome-screensaver",
                    e
                );
                None
            }
        };
        Self { logind }
    }
}

#[async_trait]
impl IdleProbe for LinuxProbe {
    fn name(&self) -> &'static str {
        if self.logind.is_some() {
            "linux (x11 + logind)"
        } else {
            "linux (x11)"
        }
    }

    async fn idle_time(&self) -> Result<Duration> {
        let err = match run_probe("xprintidle", &[]).await {
            Ok(out) => return parse_xprintidle(&out),
            Err(e) => e,
        };

        let Some(ref session) = self.logind else {
            return Err(err);
        };

        debug!("xprintidle failed ({:#}), trying logind", err);
        session.idle_time().await
    }

    async fn screen_locked(&self) -> Result<bool> {
        if let Some(ref session) = self.logind {
            match session.locked_hint().await {
                Ok(locked) => return Ok(locked),
                Err(e) => debug!("LockedHint unavailable ({:#}), trying screensaver", e),
            }
        }

        let out = run_probe("gnome-screensaver-command", &["-q"]).await?;
        Ok(parse_screensaver_query(&out))
    }
}

/// Parse `xprintidle` output (milliseconds since last input).
pub fn parse_xprintidle(output: &str) -> Result<Duration> {
    let millis: u64 = output
        .trim()
        .parse()
        .with_context(|| format!("Unexpected xprintidle output: {:?}", output.trim()))?;
    Ok(Duration::from_millis(millis))
}

/// Parse `gnome-screensaver-command -q` output.
pub fn parse_screensaver_query(output: &str) -> bool {
    output.to_lowercase().contains("is active")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xprintidle() {
        assert_eq!(
            parse_xprintidle("45000\n").unwrap(),
            Duration::from_secs(45)
        );
        assert_eq!(parse_xprintidle("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_xprintidle_garbage() {
        assert!(parse_xprintidle("").is_err());
        assert!(parse_xprintidle("couldn't open display").is_err());
    }

    #[test]
    fn test_parse_screensaver_query() {
        assert!(parse_screensaver_query("The screensaver is active\n"));
        assert!(!parse_screensaver_query("The screensaver is inactive\n"));
        assert!(parse_screensaver_query("The Screensaver IS ACTIVE"));
    }
}
