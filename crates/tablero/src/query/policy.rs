//! Staleness and retry policy for remote reads.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay schedule between retry attempts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Retry immediately.
    None,
    /// Wait the same delay before every retry.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Double (or multiply) the delay after each retry, up to a cap.
    Exponential {
        /// Delay before the first retry, in milliseconds.
        initial_ms: u64,
        /// Upper bound for any delay, in milliseconds.
        max_ms: u64,
        /// Growth factor per retry.
        multiplier: f64,
    },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            initial_ms: 1000,
            max_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl BackoffStrategy {
    /// Delay before retry number `attempt` (0 for the first retry).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Exponential {
                initial_ms,
                max_ms,
                multiplier,
            } => {
                let factor = multiplier.max(1.0).powi(attempt.min(32) as i32);
                let millis = (initial_ms as f64 * factor).min(max_ms as f64);
                Duration::from_millis(millis as u64)
            }
        }
    }
}

/// How long fetched data stays fresh and how failures are retried.
///
/// Passed to every [`QueryClient::resolve`](super::QueryClient::resolve)
/// call, so each operation can choose its own policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    /// Retries after the first attempt, for retryable failures only.
    pub max_retries: u32,
    /// Age after which cached data is served as stale and refetched.
    #[serde(rename = "stale_time_ms", with = "duration_ms")]
    pub stale_time: Duration,
    /// Delay schedule between retries.
    pub backoff: BackoffStrategy,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            stale_time: Duration::ZERO,
            backoff: BackoffStrategy::default(),
        }
    }
}

impl FetchPolicy {
    /// Dashboard panels: always revalidate, two retries.
    pub fn dashboard() -> Self {
        Self {
            max_retries: 2,
            ..Self::default()
        }
    }

    /// Headline indicators: fresh for three minutes, one retry.
    pub fn kpis() -> Self {
        Self {
            max_retries: 1,
            stale_time: Duration::from_secs(3 * 60),
            ..Self::default()
        }
    }

    /// Reference data that rarely changes: fresh for thirty minutes.
    pub fn master_data() -> Self {
        Self {
            max_retries: 1,
            stale_time: Duration::from_secs(30 * 60),
            ..Self::default()
        }
    }

    /// Alert badge summary: fresh for one minute.
    pub fn alert_summary() -> Self {
        Self {
            max_retries: 1,
            stale_time: Duration::from_secs(60),
            ..Self::default()
        }
    }

    /// Override the stale time.
    #[must_use]
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Override the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the backoff schedule.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
