//! Retry schedule for blocking lock acquisition
//!
//! Waits grow linearly: 1, 3, 5, 7, ... time units. Once the cumulative
//! sleep exceeds the wait budget the schedule ends and the caller surfaces
//! `LockWouldBlock` instead of retrying.

use std::time::Duration;

/// Default length of one backoff time unit
pub const DEFAULT_RETRY_UNIT: Duration = Duration::from_secs(1);

/// Default cumulative wait budget, in time units
pub const DEFAULT_WAIT_BUDGET: u32 = 10;

/// Bounded retry policy for blocking acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Length of one time unit
    pub unit: Duration,
    /// Cumulative sleep, in units, after which waiting stops
    pub budget: u32,
}

impl RetryPolicy {
    /// Create a policy with a custom unit and budget
    pub fn new(unit: Duration, budget: u32) -> Self {
        Self { unit, budget }
    }

    /// Start a fresh schedule of waits for one acquisition
    pub fn backoff(&self) -> Backoff {
        Backoff {
            unit: self.unit,
            budget: self.budget,
            next_units: 1,
            slept_units: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_UNIT, DEFAULT_WAIT_BUDGET)
    }
}

/// Iterator over the waits of one acquisition attempt
#[derive(Debug, Clone)]
pub struct Backoff {
    unit: Duration,
    budget: u32,
    next_units: u32,
    slept_units: u32,
}

impl Backoff {
    /// Cumulative units handed out so far
    pub fn slept_units(&self) -> u32 {
        self.slept_units
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.slept_units > self.budget {
            return None;
        }

        let units = self.next_units;
        self.slept_units = self.slept_units.saturating_add(units);
        self.next_units = self.next_units.saturating_add(2);
        Some(self.unit.saturating_mul(units))
    }
}
