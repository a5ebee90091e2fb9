//! Movement throttling.
//!
//! A jiggle is allowed when no movement happened yet, or when at least
//! `interval` has passed since the last one.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Decision from the throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDecision {
    /// Interval elapsed; move the cursor.
    Move,
    /// Too soon since the last movement.
    Wait,
}

/// Tracks the time of the last movement.
#[derive(Debug)]
pub struct MoveThrottle {
    last_move: Option<Instant>,
    interval: Duration,
}

impl MoveThrottle {
    /// Create a throttle with the given minimum interval between moves.
    pub fn new(interval: Duration) -> Self {
        Self {
            last_move: None,
            interval,
        }
    }

    /// Check whether a movement is due at `now`.
    pub fn should_move(&self, now: Instant) -> MoveDecision {
        let Some(last_move) = self.last_move else {
            debug!("No previous movement");
            return MoveDecision::Move;
        };

        let elapsed = now.saturating_duration_since(last_move);
        if elapsed >= self.interval {
            debug!(
                "Elapsed {:?} >= interval {:?}, moving",
                elapsed, self.interval
            );
            MoveDecision::Move
        } else {
            debug!(
                "Elapsed {:?} < interval {:?}, waiting",
                elapsed, self.interval
            );
            MoveDecision::Wait
        }
    }

    /// Record that a movement started at `at`.
    pub fn record_move(&mut self, at: Instant) {
        self.last_move = Some(at);
    }

    /// Time of the last recorded movement, if any.
    pub fn last_move(&self) -> Option<Instant> {
        self.last_move
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_move_always_allowed() {
        let throttle = MoveThrottle::new(Duration::from_secs(3600));
        assert_eq!(throttle.should_move(Instant::now()), MoveDecision::Move);
        assert!(throttle.last_move().is_none());
    }

    #[test]
    fn test_waits_within_interval() {
        let mut throttle = MoveThrottle::new(Duration::from_secs(90));
        let start = Instant::now();
        throttle.record_move(start);

        assert_eq!(throttle.should_move(start), MoveDecision::Wait);
        assert_eq!(
            throttle.should_move(start + Duration::from_secs(89)),
            MoveDecision::Wait
        );
    }

    #[test]
    fn test_moves_at_interval_boundary() {
        let mut throttle = MoveThrottle::new(Duration::from_secs(90));
        let start = Instant::now();
        throttle.record_move(start);

        assert_eq!(
            throttle.should_move(start + Duration::from_secs(90)),
            MoveDecision::Move
        );
        assert_eq!(
            throttle.should_move(start + Duration::from_secs(200)),
            MoveDecision::Move
        );
    }

    #[test]
    fn test_record_move_resets_window() {
        let mut throttle = MoveThrottle::new(Duration::from_secs(60));
        let start = Instant::now();
        throttle.record_move(start);

        let later = start + Duration::from_secs(61);
        assert_eq!(throttle.should_move(later), MoveDecision::Move);
        throttle.record_move(later);

        assert_eq!(throttle.last_move(), Some(later));
        assert_eq!(
            throttle.should_move(later + Duration::from_secs(30)),
            MoveDecision::Wait
        );
    }
}
