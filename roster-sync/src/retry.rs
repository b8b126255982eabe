//! Exponential-backoff retrier for status write-back.
//!
//! Wait before retry `n` (1-based count of failures so far) is
//! `base_wait * multiplier^(n-1)`, clamped to `max_wait`. With no attempt cap
//! the operation is retried until it succeeds.
//!
//! The policy holds no counters; every [`RetryPolicy::execute`] call starts
//! from scratch, so one value can wrap any number of operations.

use std::fmt;
use std::time::Duration;

use roster_core::RetrySettings;

use crate::error::RetryExhausted;

// ---------------------------------------------------------------------------
// Sleeping
// ---------------------------------------------------------------------------

/// Blocks between attempts.
pub trait Sleeper {
    fn sleep(&mut self, wait: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, wait: Duration) {
        std::thread::sleep(wait);
    }
}

/// Records requested waits instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    pub waits: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, wait: Duration) {
        self.waits.push(wait);
    }
}

impl<T: Sleeper + ?Sized> Sleeper for &mut T {
    fn sleep(&mut self, wait: Duration) {
        (**self).sleep(wait);
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Successful result plus the number of attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_wait: Duration,
    multiplier: u32,
    max_wait: Duration,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    /// 2s, 4s, 8s, then 10s forever.
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 2, Duration::from_secs(10))
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        let policy = Self::new(
            Duration::from_millis(s.base_wait_ms),
            s.multiplier,
            Duration::from_millis(s.max_wait_ms),
        );
        match s.max_attempts {
            Some(cap) => policy.with_max_attempts(cap),
            None => policy,
        }
    }
}

impl RetryPolicy {
    /// Unbounded policy. `multiplier` below 1 is treated as 1.
    pub fn new(base_wait: Duration, multiplier: u32, max_wait: Duration) -> Self {
        Self {
            base_wait,
            multiplier: multiplier.max(1),
            max_wait: max_wait.max(base_wait),
            max_attempts: None,
        }
    }

    /// Give up after `attempts` tries (at least one try is always made).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Wait after the `failures`-th consecutive failure (`failures >= 1`).
    pub fn wait_after(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        let factor = self.multiplier.saturating_pow(exponent);
        self.base_wait.saturating_mul(factor).min(self.max_wait)
    }

    /// Run `op` until it succeeds, sleeping the current thread between attempts.
    pub fn execute<T, E, F>(&self, op: F) -> Result<Retried<T>, RetryExhausted<E>>
    where
        E: fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        self.execute_with(&mut ThreadSleeper, op)
    }

    /// [`RetryPolicy::execute`] with an explicit [`Sleeper`].
    pub fn execute_with<T, E, F, Z>(
        &self,
        sleeper: &mut Z,
        mut op: F,
    ) -> Result<Retried<T>, RetryExhausted<E>>
    where
        E: fmt::Display,
        F: FnMut() -> Result<T, E>,
        Z: Sleeper + ?Sized,
    {
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            match op() {
                Ok(value) => return Ok(Retried { value, attempts }),
                Err(err) => {
                    if self.max_attempts.is_some_and(|cap| attempts >= cap) {
                        tracing::error!("attempt {attempts} failed, giving up: {err}");
                        return Err(RetryExhausted {
                            attempts,
                            last: err,
                        });
                    }
                    let wait = self.wait_after(attempts);
                    tracing::warn!(
                        "attempt {attempts} failed: {err}; retrying in {}ms",
                        wait.as_millis()
                    );
                    sleeper.sleep(wait);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
