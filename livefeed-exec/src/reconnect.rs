// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! What a disconnected session does next.
//!
//! The default is [`ReconnectPolicy::Manual`]: the session stays `Disconnected`
//! (and its sink is told so) until the owner calls `reconnect`. `Fixed` retries on
//! a constant interval, like a ticker; `Exponential` doubles the delay per attempt
//! up to a ceiling.
//!
//! ```
//! use livefeed_exec::ReconnectPolicy;
//! use std::time::Duration;
//!
//! let policy = ReconnectPolicy::exponential(
//!     Duration::from_millis(100),
//!     Duration::from_secs(1),
//!     Some(5),
//! );
//! assert_eq!(policy.delay_for(0), Some(Duration::from_millis(100)));
//! assert_eq!(policy.delay_for(3), Some(Duration::from_millis(800)));
//! assert_eq!(policy.delay_for(4), Some(Duration::from_secs(1)));
//! assert_eq!(policy.delay_for(5), None);
//! ```

use livefeed_core::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry interval used by [`ReconnectPolicy::fixed_default`].
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Reconnection strategy after a lost or failed connection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Never retry on its own.
    #[default]
    Manual,

    /// Retry every `interval_ms`.
    Fixed {
        interval_ms: u64,
        #[serde(default)]
        max_attempts: Option<u32>,
    },

    /// Retry after `base_ms * 2^attempt`, capped at `max_ms`.
    Exponential {
        base_ms: u64,
        max_ms: u64,
        #[serde(default)]
        max_attempts: Option<u32>,
    },
}

impl ReconnectPolicy {
    #[must_use]
    pub fn fixed(interval: Duration, max_attempts: Option<u32>) -> Self {
        Self::Fixed {
            interval_ms: duration_ms(interval),
            max_attempts,
        }
    }

    /// Unlimited retries every [`DEFAULT_RETRY_INTERVAL`].
    #[must_use]
    pub fn fixed_default() -> Self {
        Self::fixed(DEFAULT_RETRY_INTERVAL, None)
    }

    #[must_use]
    pub fn exponential(base: Duration, max: Duration, max_attempts: Option<u32>) -> Self {
        Self::Exponential {
            base_ms: duration_ms(base),
            max_ms: duration_ms(max),
            max_attempts,
        }
    }

    /// Delay before retry number `attempt` (zero-based), or `None` to give up.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match *self {
            Self::Manual => None,
            Self::Fixed {
                interval_ms,
                max_attempts,
            } => allowed(attempt, max_attempts).then(|| Duration::from_millis(interval_ms)),
            Self::Exponential {
                base_ms,
                max_ms,
                max_attempts,
            } => {
                if !allowed(attempt, max_attempts) {
                    return None;
                }
                let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                Some(Duration::from_millis(
                    base_ms.saturating_mul(factor).min(max_ms),
                ))
            }
        }
    }

    /// `true` if the session retries without being asked.
    #[must_use]
    pub const fn is_automatic(&self) -> bool {
        !matches!(self, Self::Manual)
    }

    /// Rejects policies that would spin or never back off.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Config` for a zero interval, a zero base delay, or a
    /// ceiling below the base delay.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Manual => Ok(()),
            Self::Fixed { interval_ms: 0, .. } => {
                Err(FeedError::config("reconnect interval_ms must be positive"))
            }
            Self::Fixed { .. } => Ok(()),
            Self::Exponential { base_ms: 0, .. } => {
                Err(FeedError::config("reconnect base_ms must be positive"))
            }
            Self::Exponential { base_ms, max_ms, .. } if max_ms < base_ms => Err(FeedError::config(
                format!("reconnect max_ms ({max_ms}) is below base_ms ({base_ms})"),
            )),
            Self::Exponential { .. } => Ok(()),
        }
    }
}

fn allowed(attempt: u32, max_attempts: Option<u32>) -> bool {
    max_attempts.map_or(true, |max| attempt < max)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
