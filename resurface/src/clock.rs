//! Time source for the store and pipeline, in seconds since the Unix epoch.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Wall-clock abstraction so day boundaries and cooldowns can be driven in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        let now = chrono::Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1e6
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    secs: Mutex<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            secs: Mutex::new(start),
        }
    }

    pub fn set(&self, secs: f64) {
        *self.secs.lock().unwrap_or_else(|e| e.into_inner()) = secs;
    }

    pub fn advance(&self, delta: f64) {
        *self.secs.lock().unwrap_or_else(|e| e.into_inner()) += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.secs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// UTC calendar day of a timestamp. Out-of-range timestamps map to the epoch day.
pub fn utc_day(timestamp: f64) -> NaiveDate {
    DateTime::from_timestamp(timestamp.floor() as i64, 0)
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}
