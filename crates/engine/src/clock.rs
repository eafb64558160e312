//! Source of the current time used for every timestamp the engine writes.

use std::fmt::Debug;

use chrono::{DateTime, Utc};

pub trait Clock: Debug + Send + Sync {
    /// Gets the current instant.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {}

/// A clock frozen at a given instant, for reproducible timestamps.
#[derive(Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
