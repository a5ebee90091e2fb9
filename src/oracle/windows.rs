//! Windows idle and lock probe via the Win32 input APIs.
//!
//! Idle time: `GetTickCount` minus `GetLastInputInfo`.
//! Lock state: no foreground window means the secure desktop is showing.

use std::time::Duration;

#[cfg(windows)]
use anyhow::Result;
#[cfg(windows)]
use async_trait::async_trait;
#[cfg(windows)]
use winapi::um::sysinfoapi::GetTickCount;
#[cfg(windows)]
use winapi::um::winuser::{GetForegroundWindow, GetLastInputInfo, LASTINPUTINFO};

#[cfg(windows)]
use super::IdleProbe;

/// Idle time from two millisecond tick readings.
///
/// Tick counts wrap every ~49.7 days; wrapping subtraction keeps the
/// difference correct across one rollover.
pub fn idle_from_ticks(now_ticks: u32, last_input_ticks: u32) -> Duration {
    Duration::from_millis(u64::from(now_ticks.wrapping_sub(last_input_ticks)))
}

/// Windows probe backed by user32 and kernel32.
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct WindowsProbe;

#[cfg(windows)]
#[async_trait]
impl IdleProbe for WindowsProbe {
    fn name(&self) -> &'static str {
        "windows (user32)"
    }

    async fn idle_time(&self) -> Result<Duration> {
        let mut info = LASTINPUTINFO {
            cbSize: u32::try_from(std::mem::size_of::<LASTINPUTINFO>())?,
            dwTime: 0,
        };
        // SAFETY: `info` is a writable LASTINPUTINFO with `cbSize` set.
        if unsafe { GetLastInputInfo(&raw mut info) } == 0 {
            anyhow::bail!("GetLastInputInfo failed");
        }
        // SAFETY: GetTickCount takes no arguments and cannot fail.
        let now = unsafe { GetTickCount() };

        Ok(idle_from_ticks(now, info.dwTime))
    }

    async fn screen_locked(&self) -> Result<bool> {
        // SAFETY: GetForegroundWindow takes no arguments; null is a valid result.
        let hwnd = unsafe { GetForegroundWindow() };
        Ok(hwnd.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_from_ticks() {
        assert_eq!(idle_from_ticks(100_000, 55_000), Duration::from_secs(45));
        assert_eq!(idle_from_ticks(7, 7), Duration::ZERO);
    }

    #[test]
    fn test_idle_from_ticks_across_rollover() {
        // Last input 1s before the counter wrapped, now 2s after
        let last_input = u32::MAX - 999;
        let now = 2_000;
        assert_eq!(idle_from_ticks(now, last_input), Duration::from_secs(3));
    }
}
