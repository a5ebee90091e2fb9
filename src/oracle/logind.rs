//! Session idle and lock hints via systemd-logind `DBus` interface.
//!
//! Reads `IdleHint`, `IdleSinceHintMonotonic` and `LockedHint` from the
//! current session.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, trace};
use zbus::Connection;
use zbus::zvariant::OwnedValue;

/// `DBus` service and path for login1.
const LOGIND_SERVICE: &str = "org.freedesktop.login1";
const LOGIND_PATH: &str = "/org/freedesktop/login1";
const MANAGER_INTERFACE: &str = "org.freedesktop.login1.Manager";
const SESSION_INTERFACE: &str = "org.freedesktop.login1.Session";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Handle to the current logind session.
pub struct LogindSession {
    conn: Connection,

    /// Session object path in `DBus`.
    path: String,
}

impl LogindSession {
    /// Connect to the system bus and resolve the current session.
    pub async fn connect() -> Result<Self> {
        let conn = Connection::system()
            .await
            .context("Failed to connect to system DBus")?;

        let path = resolve_session_path(&conn).await?;
        info!("Resolved logind session path: {}", path);

        Ok(Self { conn, path })
    }

    /// Whether the session is flagged as locked.
    pub async fn locked_hint(&self) -> Result<bool> {
        let locked = get_bool_property(&self.conn, &self.path, "LockedHint").await?;
        trace!("LockedHint: {}", locked);
        Ok(locked)
    }

    /// Idle time derived from `IdleHint` and `IdleSinceHintMonotonic`.
    ///
    /// Returns zero while the session is not idle.
    pub async fn idle_time(&self) -> Result<Duration> {
        if !get_bool_property(&self.conn, &self.path, "IdleHint").await? {
            trace!("IdleHint: false");
            return Ok(Duration::ZERO);
        }

        let since_usec =
            get_u64_property(&self.conn, &self.path, "IdleSinceHintMonotonic").await?;
        let now_usec = monotonic_now_usec().context("Monotonic clock unavailable")?;

        let idle = idle_since(since_usec, now_usec);
        trace!("IdleHint: true, idle for {:?}", idle);
        Ok(idle)
    }
}

/// Idle duration between a monotonic timestamp and now, both in microseconds.
pub fn idle_since(since_usec: u64, now_usec: u64) -> Duration {
    Duration::from_micros(now_usec.saturating_sub(since_usec))
}

/// Current `CLOCK_MONOTONIC` reading in microseconds.
#[cfg(target_os = "linux")]
fn monotonic_now_usec() -> Option<u64> {
    let ts = rustix::time::clock_gettime(rustix::time::ClockId::Monotonic);
    let secs = u64::try_from(ts.tv_sec).ok()?;
    let nanos = u64::try_from(ts.tv_nsec).ok()?;
    Some(secs * 1_000_000 + nanos / 1_000)
}

#[cfg(not(target_os = "linux"))]
fn monotonic_now_usec() -> Option<u64> {
    None
}

/// Resolve the session object path for the current session.
async fn resolve_session_path(conn: &Connection) -> Result<String> {
    // First try XDG_SESSION_ID if available
    if let Ok(session_id) = env::var("XDG_SESSION_ID") {
        debug!("Using XDG_SESSION_ID: {}", session_id);

        let proxy = zbus::Proxy::new(conn, LOGIND_SERVICE, LOGIND_PATH, MANAGER_INTERFACE)
            .await
            .context("Failed to create Manager proxy")?;

        let path: zbus::zvariant::OwnedObjectPath = proxy
            .call("GetSession", &(&session_id,))
            .await
            .context("GetSession call failed")?;

        return Ok(path.to_string());
    }

    debug!("XDG_SESSION_ID not set, trying to find current session");

    // Probe "self" then "auto" by reading LockedHint
    for name in ["self", "auto"] {
        let path = format!("{LOGIND_PATH}/session/{name}");
        if get_bool_property(conn, &path, "LockedHint").await.is_ok() {
            return Ok(path);
        }
    }

    anyhow::bail!(
        "Could not resolve session path. Set XDG_SESSION_ID or ensure logind session is available."
    )
}

/// Read a raw session property.
async fn get_property(conn: &Connection, session_path: &str, name: &str) -> Result<OwnedValue> {
    let proxy = zbus::Proxy::new(conn, LOGIND_SERVICE, session_path, PROPERTIES_INTERFACE)
        .await
        .context("Failed to create Properties proxy")?;

    let value: OwnedValue = proxy
        .call("Get", &(SESSION_INTERFACE, name))
        .await
        .with_context(|| format!("Failed to get {name} property"))?;

    Ok(value)
}

async fn get_bool_property(conn: &Connection, session_path: &str, name: &str) -> Result<bool> {
    let value = get_property(conn, session_path, name).await?;
    value
        .downcast_ref::<bool>()
        .map_err(|_| anyhow::anyhow!("{name} is not a boolean"))
}

async fn get_u64_property(conn: &Connection, session_path: &str, name: &str) -> Result<u64> {
    let value = get_property(conn, session_path, name).await?;
    value
        .downcast_ref::<u64>()
        .map_err(|_| anyhow::anyhow!("{name} is not a u64"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_since() {
        assert_eq!(idle_since(1_000_000, 46_000_000), Duration::from_secs(45));
        assert_eq!(idle_since(0, 1_500), Duration::from_micros(1_500));
    }

    #[test]
    fn test_idle_since_clock_skew() {
        // Hint newer than our clock reading reads as not idle
        assert_eq!(idle_since(50, 10), Duration::ZERO);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_monotonic_clock_advances() {
        let a = monotonic_now_usec().unwrap();
        std::thread::sleep(Duration::from_millis(2));
        let b = monotonic_now_usec().unwrap();
        assert!(b > a);
    }
}
