//! Local wall-clock source for completion timestamps and day bucketing.

use chrono::{Local, NaiveDate, NaiveDateTime};
use std::cell::Cell;

/// Supplies the local naive date-time the engine stamps logs with.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    /// Local calendar day used for habit dedup and view bucketing.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
