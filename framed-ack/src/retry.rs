//! Retry policy for the send-and-wait loop.
//!
//! The bare protocol resends forever, immediately, and waits for a reply
//! without a deadline.  [`RetryPolicy`] keeps that as its default and adds
//! three independent guards:
//! - an attempt cap (`max_attempts`),
//! - a per-attempt reply deadline (`reply_timeout`), whose expiry counts as a
//!   negative acknowledgment,
//! - exponential back-off between a negative reply and the next resend,
//!   doubling per consecutive failure up to `max_backoff`.

use std::time::Duration;

/// Default upper bound on back-off growth.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Adjustable retry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total sends allowed before giving up; `None` = unbounded.
    pub max_attempts: Option<u32>,
    /// How long to wait for a reply after each send; `None` = forever.
    pub reply_timeout: Option<Duration>,
    /// Delay before the first resend.  Zero disables back-off.
    pub backoff: Duration,
    /// Cap on the doubled delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            reply_timeout: None,
            backoff: Duration::ZERO,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Policy with no guards: resend immediately, forever.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = initial;
        self.max_backoff = max;
        self
    }

    /// `true` if another send is allowed after `attempts` sends.
    pub fn allows_another(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }

    /// Delay to sleep before resend number `failures + 1`, where `failures`
    /// is the count of consecutive negative replies so far (>= 1).
    pub fn delay_after(&self, failures: u32) -> Duration {
        if self.backoff.is_zero() || failures == 0 {
            return Duration::ZERO;
        }
        let shift = (failures - 1).min(31);
        self.backoff
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}
