//! idle-jiggler - keeps the session awake by nudging the cursor while idle.
//!
//! The jiggle loop combines screen-lock state, system idle time and the time
//! since the last movement to decide when to draw a small circle with the
//! cursor.

pub mod config;
pub mod domain;
pub mod injector;
pub mod jiggle;
pub mod oracle;
pub mod throttle;
