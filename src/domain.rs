//! Domain types shared by the jiggle loop, oracle and injector.

use std::fmt;
use std::time::Duration;

/// A cursor position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Validated loop configuration, immutable for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JiggleConfig {
    /// Minimum time between two movements.
    pub interval: Duration,

    /// Radius of the jiggle circle in pixels.
    pub circle_radius: u32,

    /// Number of points visited on the circle.
    pub circle_steps: u32,

    /// How long the machine must be idle before a movement is allowed.
    pub idle_threshold: Duration,
}

impl Default for JiggleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            circle_radius: 25,
            circle_steps: 20,
            idle_threshold: Duration::from_secs(30),
        }
    }
}

/// State of the jiggle loop after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// About to query the oracle.
    Checking,
    /// Screen is locked; movement skipped.
    SkippingLocked,
    /// User is active; movement skipped.
    SkippingActive,
    /// Idle, but the interval has not elapsed yet.
    Waiting,
    /// A jiggle was performed.
    Moving,
    /// Terminal: the injector failed.
    Stopped,
}

impl LoopState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::SkippingLocked => "skipping (locked)",
            Self::SkippingActive => "skipping (active)",
            Self::Waiting => "waiting",
            Self::Moving => "moving",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_jiggle_config() {
        let config = JiggleConfig::default();
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.circle_radius, 25);
        assert_eq!(config.circle_steps, 20);
        assert_eq!(config.idle_threshold, Duration::from_secs(30));
    }

    #[test]
    fn test_point_from_tuple() {
        let point: Point = (10, -4).into();
        assert_eq!(point, Point::new(10, -4));
        assert_eq!(point.to_string(), "(10, -4)");
    }

    #[test]
    fn test_loop_state_display() {
        assert_eq!(LoopState::SkippingLocked.to_string(), "skipping (locked)");
        assert_eq!(LoopState::Stopped.to_string(), "stopped");
    }
}
