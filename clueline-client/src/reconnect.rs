//! Reconnection strategies
//!
//! When the link drops (or an attempt fails) the strategy decides how long
//! to wait before the next attempt, or that the client should give up.
//!
//! # Built-in Strategies
//!
//! - **ExponentialBackoff**: `base * 2^(n-1)` before the n-th attempt (default)
//! - **FixedDelay**: constant delay
//! - **NoReconnect**: never reconnect
//!
//! The default schedule is the game server's contract: 1 s, 2 s, 4 s, 8 s,
//! 16 s, then stop. No jitter and no delay cap unless asked for.
//!
//! # Examples
//!
//! ```rust
//! use clueline_client::{ExponentialBackoff, ReconnectionStrategy};
//! use std::time::Duration;
//!
//! let mut backoff = ExponentialBackoff::default();
//! assert_eq!(backoff.next_delay(0), Some(Duration::from_secs(1)));
//! assert_eq!(backoff.next_delay(4), Some(Duration::from_secs(16)));
//! assert_eq!(backoff.next_delay(5), None);
//! ```

use std::time::Duration;

/// Default base delay before the first reconnection attempt
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default number of consecutive reconnection attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Decides the delay before each reconnection attempt
///
/// `attempt` is the number of consecutive attempts already made since the
/// last successful connection (0 for the first retry). `reset()` is called
/// whenever a connection succeeds or the client is disconnected manually.
pub trait ReconnectionStrategy: Send + Sync {
    /// Delay before the next attempt, or `None` to give up
    fn next_delay(&mut self, attempt: u32) -> Option<Duration>;

    /// Forget any accumulated state
    fn reset(&mut self);
}

/// Exponential backoff, optionally capped and jittered
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Option<Duration>,
    max_attempts: Option<u32>,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Unlimited attempts starting at `base_delay`
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: None,
            max_attempts: None,
            jitter: false,
        }
    }

    /// Give up after this many consecutive attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Never wait longer than `max_delay`
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Add up to 25% random jitter on top of each delay
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Maximum number of attempts, if limited
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY).with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return None;
            }
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let mut delay_ms = base_ms.saturating_mul(factor);

        if let Some(max_delay) = self.max_delay {
            delay_ms = delay_ms.min(max_delay.as_millis() as u64);
        }

        if self.jitter {
            use rand::Rng;
            let jitter_ms = rand::thread_rng().gen_range(0..=(delay_ms / 4));
            delay_ms = delay_ms.saturating_add(jitter_ms);
        }

        Some(Duration::from_millis(delay_ms))
    }

    fn reset(&mut self) {}
}

/// Constant delay between attempts
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelay {
    /// Unlimited attempts, `delay` apart
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Give up after this many consecutive attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(self.delay),
        }
    }

    fn reset(&mut self) {}
}

/// Never reconnect
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnect;

impl ReconnectionStrategy for NoReconnect {
    fn next_delay(&mut self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn reset(&mut self) {}
}
