//! Time source for server-assigned timestamps.

use chrono::{DateTime, Utc};

/// Supplies "now" to the catalog services.
///
/// Injected so tests can control timestamps; production code uses
/// [`SystemClock`].
pub trait Clock: Send + Sync + core::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
