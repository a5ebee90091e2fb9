//! Cursor injection backends.
//!
//! The jiggle loop only needs to read the cursor position, know the display
//! size for the corner fail-safe, and warp the cursor to a point.

use enigo::{Coordinate, Enigo, Mouse};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Point;

/// Nominal display used by the dry-run injector.
const DRY_RUN_DISPLAY: (i32, i32) = (1920, 1080);

/// Errors that can occur while moving the cursor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectError {
    #[error("Fail-safe triggered: cursor is in a screen corner at ({x}, {y})")]
    FailSafe { x: i32, y: i32 },

    #[error("Failed to connect to input backend: {0}")]
    Connect(String),

    #[error("Cursor input failed: {0}")]
    Input(String),
}

/// Capability to read and move the cursor.
pub trait CursorInjector {
    /// Current cursor position.
    fn position(&self) -> Result<Point, InjectError>;

    /// Size of the main display in pixels.
    fn display_size(&self) -> Result<(i32, i32), InjectError>;

    /// Move the cursor to an absolute position.
    fn move_to(&mut self, target: Point) -> Result<(), InjectError>;
}

/// Check that `pos` is not in one of the four display corners.
pub fn check_fail_safe(pos: Point, (width, height): (i32, i32)) -> Result<(), InjectError> {
    let right = width - 1;
    let bottom = height - 1;
    let corners = [(0, 0), (right, 0), (0, bottom), (right, bottom)];

    if corners.contains(&(pos.x, pos.y)) {
        return Err(InjectError::FailSafe { x: pos.x, y: pos.y });
    }
    Ok(())
}

/// Real cursor injector backed by enigo.
pub struct EnigoInjector {
    enigo: Enigo,
}

impl EnigoInjector {
    /// Connect to the platform input backend.
    pub fn new() -> Result<Self, InjectError> {
        let enigo = Enigo::new(&enigo::Settings::default())
            .map_err(|e| InjectError::Connect(e.to_string()))?;
        info!("Connected to cursor input backend");
        Ok(Self { enigo })
    }
}

impl CursorInjector for EnigoInjector {
    fn position(&self) -> Result<Point, InjectError> {
        self.enigo
            .location()
            .map(Point::from)
            .map_err(|e| InjectError::Input(e.to_string()))
    }

    fn display_size(&self) -> Result<(i32, i32), InjectError> {
        self.enigo
            .main_display()
            .map_err(|e| InjectError::Input(e.to_string()))
    }

    fn move_to(&mut self, target: Point) -> Result<(), InjectError> {
        self.enigo
            .move_mouse(target.x, target.y, Coordinate::Abs)
            .map_err(|e| InjectError::Input(e.to_string()))
    }
}

/// Injector that logs movements against a virtual cursor.
#[derive(Debug)]
pub struct DryRunInjector {
    cursor: Point,
    display: (i32, i32),
}

impl DryRunInjector {
    /// Start with the virtual cursor centred on a nominal display.
    pub fn new() -> Self {
        let (width, height) = DRY_RUN_DISPLAY;
        Self {
            cursor: Point::new(width / 2, height / 2),
            display: DRY_RUN_DISPLAY,
        }
    }
}

impl Default for DryRunInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorInjector for DryRunInjector {
    fn position(&self) -> Result<Point, InjectError> {
        Ok(self.cursor)
    }

    fn display_size(&self) -> Result<(i32, i32), InjectError> {
        Ok(self.display)
    }

    fn move_to(&mut self, target: Point) -> Result<(), InjectError> {
        debug!("[DRY RUN] Would move cursor {} -> {}", self.cursor, target);
        self.cursor = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_safe_corners() {
        let display = (1920, 1080);
        for (x, y) in [(0, 0), (1919, 0), (0, 1079), (1919, 1079)] {
            assert_eq!(
                check_fail_safe(Point::new(x, y), display),
                Err(InjectError::FailSafe { x, y })
            );
        }
    }

    #[test]
    fn test_fail_safe_allows_edges() {
        let display = (1920, 1080);
        assert!(check_fail_safe(Point::new(960, 540), display).is_ok());
        assert!(check_fail_safe(Point::new(0, 540), display).is_ok());
        assert!(check_fail_safe(Point::new(960, 0), display).is_ok());
        assert!(check_fail_safe(Point::new(1918, 1079), display).is_ok());
    }

    #[test]
    fn test_dry_run_tracks_virtual_cursor() {
        let mut injector = DryRunInjector::new();
        assert_eq!(injector.position().unwrap(), Point::new(960, 540));
        assert_eq!(injector.display_size().unwrap(), (1920, 1080));

        injector.move_to(Point::new(10, 20)).unwrap();
        assert_eq!(injector.position().unwrap(), Point::new(10, 20));
    }
}
