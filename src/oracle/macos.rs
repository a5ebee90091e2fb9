//! macOS idle and lock probe via `ioreg`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use super::IdleProbe;
use super::command::run_probe;

static HID_IDLE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""HIDIdleTime"\s*=\s*(\d+)"#).expect("HIDIdleTime pattern is valid")
});

static SCREEN_LOCKED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""CGSSessionScreenIsLocked"\s*=\s*Yes"#)
        .expect("CGSSessionScreenIsLocked pattern is valid")
});

/// macOS probe reading the IOKit registry.
#[derive(Debug, Default)]
pub struct MacProbe;

#[async_trait]
impl IdleProbe for MacProbe {
    fn name(&self) -> &'static str {
        "macos (ioreg)"
    }

    async fn idle_time(&self) -> Result<Duration> {
        let out = run_probe("ioreg", &["-c", "IOHIDSystem"]).await?;
        parse_hid_idle_time(&out)
    }

    async fn screen_locked(&self) -> Result<bool> {
        let out = run_probe("ioreg", &["-n", "Root", "-d1", "-k", "IOConsoleUsers"]).await?;
        Ok(parse_screen_locked(&out))
    }
}

/// Extract `HIDIdleTime` (nanoseconds) from `ioreg -c IOHIDSystem` output.
pub fn parse_hid_idle_time(output: &str) -> Result<Duration> {
    let caps = HID_IDLE_TIME
        .captures(output)
        .context("HIDIdleTime not found in ioreg output")?;
    let nanos: u64 = caps[1].parse().context("HIDIdleTime is not a number")?;
    Ok(Duration::from_nanos(nanos))
}

/// Whether the console session reports a locked screen.
pub fn parse_screen_locked(output: &str) -> bool {
    SCREEN_LOCKED.is_match(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IOREG_HID: &str = r#"
+-o IOHIDSystem  <class IOHIDSystem, id 0x100000481, registered, matched, active, busy 0 (0 ms), retain 22>
    {
      "HIDIdleTime" = 45250000000
      "HIDParameters" = {"HIDClickTime"=500000000}
    }
"#;

    #[test]
    fn test_parse_hid_idle_time() {
        assert_eq!(
            parse_hid_idle_time(IOREG_HID).unwrap(),
            Duration::from_millis(45_250)
        );
    }

    #[test]
    fn test_parse_hid_idle_time_missing() {
        assert!(parse_hid_idle_time("+-o IOHIDSystem\n    {\n    }\n").is_err());
    }

    #[test]
    fn test_parse_screen_locked() {
        let locked = r#"  "IOConsoleUsers" = ({"kCGSSessionOnConsoleKey"=Yes,"CGSSessionScreenIsLocked"=Yes,"kCGSSessionUserIDKey"=501})"#;
        let unlocked =
            r#"  "IOConsoleUsers" = ({"kCGSSessionOnConsoleKey"=Yes,"kCGSSessionUserIDKey"=501})"#;

        assert!(parse_screen_locked(locked));
        assert!(!parse_screen_locked(unlocked));
    }
}
