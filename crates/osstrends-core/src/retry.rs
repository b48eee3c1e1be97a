//! Retry delays: capped exponential backoff, or waiting out a rate limit

use std::sync::atomic::AtomicBool;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::shutdown::{shutdown_flag, sleep_interruptible};

/// Errors that know whether another attempt can help.
pub trait Retryable: std::fmt::Display {
    fn is_retryable(&self) -> bool {
        true
    }

    /// Epoch second before which retrying is pointless (quota reset).
    fn retry_not_before(&self) -> Option<u64> {
        None
    }
}

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failure; zero disables backoff entirely
    pub base_delay: Duration,
    /// Upper bound for exponential backoff
    pub max_delay: Duration,
    /// Upper bound for waiting on a rate-limit reset
    pub max_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            max_rate_limit_wait: Duration::from_secs(15 * 60),
        }
    }
}

impl RetryPolicy {
    /// Re-queue immediately, no waiting of any kind.
    pub const fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_rate_limit_wait: Duration::ZERO,
        }
    }

    /// Exponential backoff: base * 2^(attempt-1), capped at `max_delay`.
    ///
    /// `attempt` is 1 for the first failure.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() || attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Time until `reset_epoch` (plus one second of slack), capped.
    pub fn rate_limit_wait(&self, reset_epoch: u64, now_epoch: u64) -> Duration {
        let secs = reset_epoch.saturating_sub(now_epoch).saturating_add(1);
        Duration::from_secs(secs).min(self.max_rate_limit_wait)
    }

    /// Delay to apply after `err` on failed attempt number `attempt`.
    pub fn delay_for<E: Retryable + ?Sized>(&self, err: &E, attempt: u32) -> Duration {
        match err.retry_not_before() {
            Some(reset) => self.rate_limit_wait(reset, now_epoch()),
            None => self.backoff(attempt),
        }
    }
}

/// Current wall-clock time in epoch seconds.
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Retry a fallible operation up to `max_attempts` times.
///
/// On retryable errors, logs the failure, sleeps per `policy` and retries.
/// Returns `Ok(T)` on first success, or the final `Err` on exhaustion /
/// non-retryable error / shutdown request.
pub fn retry_with_backoff<T, E: Retryable>(
    label: &str,
    policy: &RetryPolicy,
    max_attempts: u32,
    attempt_fn: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    retry_until(label, policy, max_attempts, shutdown_flag(), attempt_fn)
}

/// [`retry_with_backoff`] with waits cut short by `stop`.
///
/// An interrupted wait returns the last error without another attempt.
pub fn retry_until<T, E: Retryable>(
    label: &str,
    policy: &RetryPolicy,
    max_attempts: u32,
    stop: &AtomicBool,
    mut attempt_fn: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                let delay = policy.delay_for(&e, attempt);
                log::warn!(
                    "{label}: attempt {attempt}/{max_attempts} failed: {e}, retrying in {delay:?}"
                );
                if !sleep_interruptible(stop, delay) {
                    log::warn!("{label}: shutdown requested, giving up after attempt {attempt}");
                    return Err(e);
                }
            }
            Err(e) => {
                log::error!("{label}: failed permanently after {attempt} attempt(s): {e}");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Flaky {
        retryable: bool,
        reset: Option<u64>,
    }

    impl std::fmt::Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("flaky")
        }
    }

    impl Retryable for Flaky {
        fn is_retryable(&self) -> bool {
            self.retryable
        }

        fn retry_not_before(&self) -> Option<u64> {
            self.reset
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            max_rate_limit_wait: Duration::from_secs(30),
        }
    }

    #[test]
    fn backoff_exponential_and_capped() {
        let p = policy();
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(2), Duration::from_secs(4));
        assert_eq!(p.backoff(3), Duration::from_secs(8));
        assert_eq!(p.backoff(4), Duration::from_secs(10));
        assert_eq!(p.backoff(200), Duration::from_secs(10));
    }

    #[test]
    fn immediate_never_waits() {
        let p = RetryPolicy::immediate();
        assert_eq!(p.backoff(5), Duration::ZERO);
        assert_eq!(p.rate_limit_wait(now_epoch() + 100, now_epoch()), Duration::ZERO);
    }

    #[test]
    fn rate_limit_wait_until_reset() {
        let p = policy();
        assert_eq!(p.rate_limit_wait(1_000, 990), Duration::from_secs(11));
        // Reset already passed: one second of slack
        assert_eq!(p.rate_limit_wait(1_000, 2_000), Duration::from_secs(1));
        // Capped
        assert_eq!(p.rate_limit_wait(10_000, 0), Duration::from_secs(30));
    }

    #[test]
    fn delay_for_prefers_reset_hint() {
        let p = policy();
        let plain = Flaky {
            retryable: true,
            reset: None,
        };
        assert_eq!(p.delay_for(&plain, 2), Duration::from_secs(4));
        let limited = Flaky {
            retryable: true,
            reset: Some(u64::MAX),
        };
        assert_eq!(p.delay_for(&limited, 2), Duration::from_secs(30));
    }

    #[test]
    fn retry_succeeds_after_failures() {
        let mut calls = 0;
        let result = retry_with_backoff("test", &RetryPolicy::immediate(), 5, || {
            calls += 1;
            if calls < 3 {
                Err(Flaky {
                    retryable: true,
                    reset: None,
                })
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn retry_stops_on_non_retryable() {
        let mut calls = 0;
        let result: Result<(), _> = retry_with_backoff("test", &RetryPolicy::immediate(), 5, || {
            calls += 1;
            Err(Flaky {
                retryable: false,
                reset: None,
            })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn retry_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = retry_with_backoff("test", &RetryPolicy::immediate(), 3, || {
            calls += 1;
            Err(Flaky {
                retryable: true,
                reset: None,
            })
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn retry_wait_cut_short_by_stop_flag() {
        let stop = AtomicBool::new(true);
        let mut calls = 0;
        let started = std::time::Instant::now();
        let result: Result<(), _> = retry_until("test", &policy(), 2, &stop, || {
            calls += 1;
            Err(Flaky {
                retryable: true,
                reset: None,
            })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn retry_waits_out_backoff_when_not_stopped() {
        let stop = AtomicBool::new(false);
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(50),
            ..policy()
        };
        let mut calls = 0;
        let started = std::time::Instant::now();
        let result = retry_until("test", &policy, 2, &stop, || {
            calls += 1;
            if calls == 1 {
                Err(Flaky {
                    retryable: true,
                    reset: None,
                })
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 2);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
