//! The jiggle loop.
//!
//! Each tick checks lock state, then idle time, then the move interval, and
//! either skips, waits, or draws a small circle with the cursor. The loop
//! runs until cancelled or until the injector fails.

use std::f64::consts::PI;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{JiggleConfig, LoopState, Point};
use crate::injector::{CursorInjector, InjectError, check_fail_safe};
use crate::oracle::ActivityOracle;
use crate::throttle::{MoveDecision, MoveThrottle};

/// Sleep between checks when not moving.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Pause after each point of the circle.
pub const STEP_PAUSE: Duration = Duration::from_millis(150);

/// Why the loop ended.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    #[error("Cancelled")]
    Cancelled,

    #[error(transparent)]
    Injector(#[from] InjectError),
}

/// Points of a circle around `origin`, starting at angle zero.
#[allow(clippy::cast_possible_truncation)]
pub fn circle_path(origin: Point, radius: u32, steps: u32) -> Vec<Point> {
    let radius = f64::from(radius);
    let steps_f = f64::from(steps);

    (0..steps)
        .map(|i| {
            let angle = 2.0 * PI * f64::from(i) / steps_f;
            Point::new(
                origin.x.saturating_add((radius * angle.cos()) as i32),
                origin.y.saturating_add((radius * angle.sin()) as i32),
            )
        })
        .collect()
}

/// Idle-gated cursor jiggler.
pub struct Jiggler<I> {
    config: JiggleConfig,
    oracle: ActivityOracle,
    injector: I,
    throttle: MoveThrottle,
    state: LoopState,
    /// Last state reported at info level.
    reported: Option<LoopState>,
    shutdown: CancellationToken,
}

impl<I: CursorInjector> Jiggler<I> {
    pub fn new(
        config: JiggleConfig,
        oracle: ActivityOracle,
        injector: I,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            throttle: MoveThrottle::new(config.interval),
            config,
            oracle,
            injector,
            state: LoopState::Checking,
            reported: None,
            shutdown,
        }
    }

    /// Current loop state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Time of the last completed jiggle.
    pub fn last_move(&self) -> Option<Instant> {
        self.throttle.last_move()
    }

    /// Run ticks until cancelled or the injector fails.
    pub async fn run(&mut self) -> StopReason {
        info!(
            "Jiggler running: interval {:?}, idle threshold {:?}, radius {}px, {} steps",
            self.config.interval,
            self.config.idle_threshold,
            self.config.circle_radius,
            self.config.circle_steps
        );

        loop {
            if let Err(reason) = self.tick().await {
                return reason;
            }
        }
    }

    /// Perform one decision cycle, including its trailing sleep.
    ///
    /// Returns the state the tick went through.
    pub async fn tick(&mut self) -> Result<LoopState, StopReason> {
        if self.shutdown.is_cancelled() {
            return Err(StopReason::Cancelled);
        }

        let now = Instant::now();
        self.state = LoopState::Checking;

        if self.oracle.is_locked().await {
            self.enter(
                LoopState::SkippingLocked,
                "Screen is locked - skipping movement",
            );
            self.pause(POLL_INTERVAL).await?;
            return Ok(LoopState::SkippingLocked);
        }

        let idle = self.oracle.idle_seconds().await;
        if idle < self.config.idle_threshold.as_secs_f64() {
            self.enter(
                LoopState::SkippingActive,
                &format!("Machine active (idle {idle:.1}s) - skipping movement"),
            );
            self.pause(POLL_INTERVAL).await?;
            return Ok(LoopState::SkippingActive);
        }

        match self.throttle.should_move(now) {
            MoveDecision::Move => {
                self.enter(
                    LoopState::Moving,
                    &format!("Machine idle {idle:.1}s - moving cursor"),
                );
                if let Err(reason) = self.jiggle().await {
                    if let StopReason::Injector(ref e) = reason {
                        self.state = LoopState::Stopped;
                        warn!("Cursor movement failed, {}: {}", self.state, e);
                    }
                    return Err(reason);
                }
                self.throttle.record_move(now);
                Ok(LoopState::Moving)
            }
            MoveDecision::Wait => {
                self.enter(
                    LoopState::Waiting,
                    &format!("Machine idle {idle:.1}s - waiting for next interval"),
                );
                self.pause(POLL_INTERVAL).await?;
                Ok(LoopState::Waiting)
            }
        }
    }

    /// Record a state change, logging at info only when it differs from the last one.
    fn enter(&mut self, state: LoopState, message: &str) {
        self.state = state;
        match self.reported {
            Some(prev) if prev == state && state != LoopState::Moving => debug!("{}", message),
            Some(prev) => {
                debug!("State changed: {} -> {}", prev, state);
                info!("{}", message);
            }
            None => info!("{}", message),
        }
        self.reported = Some(state);
    }

    /// Draw a circle around the current position and return to it.
    async fn jiggle(&mut self) -> Result<(), StopReason> {
        let display = self.injector.display_size()?;
        let origin = self.injector.position()?;
        let path = circle_path(origin, self.config.circle_radius, self.config.circle_steps);
        debug!("Jiggling {} points around {}", path.len(), origin);

        for point in path {
            self.step_to(point, display)?;
            self.pause(STEP_PAUSE).await?;
        }
        self.step_to(origin, display)?;

        Ok(())
    }

    /// Move to `target` unless the cursor sits in a display corner.
    fn step_to(&mut self, target: Point, display: (i32, i32)) -> Result<(), InjectError> {
        check_fail_safe(self.injector.position()?, display)?;
        self.injector.move_to(target)
    }

    /// Sleep for `duration`, returning early if cancelled.
    async fn pause(&self, duration: Duration) -> Result<(), StopReason> {
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(StopReason::Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
