//! Bounded retry/poll primitive.
//!
//! Every wait in the scraper is expressed as "probe up to N times, sleeping
//! between attempts": the lazy-load thumbnail poll, the wait for video links
//! on the account page, and the wait for any detail selector on a video page.
//! [`Backoff`] owns the timing policy so the DOM code only supplies the probe.
//!
//! # Delay Strategy
//!
//! ```text
//! delay(attempt) = min(base_delay * multiplier^(attempt-1), max_delay) + random_jitter(0..=jitter)
//! ```
//!
//! With `multiplier == 1` and no jitter this is a plain fixed-interval poll,
//! which is what all of the built-in waits use.

use rand::{Rng, rng};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument};

/// Timing policy for a bounded sequence of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Total number of probes, including the first one.
    pub max_attempts: usize,
    /// Delay after the first failed probe.
    pub base_delay: Duration,
    /// Growth factor applied per attempt (1 = fixed interval).
    pub multiplier: u32,
    /// Upper bound on the computed delay, before jitter.
    pub max_delay: Duration,
    /// Upper bound on the random extra delay added to every sleep.
    pub jitter: Duration,
}

impl Backoff {
    /// Fixed-interval policy: `attempts` probes separated by `delay`.
    pub fn fixed(attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: attempts,
            base_delay: delay,
            multiplier: 1,
            max_delay: delay,
            jitter: Duration::ZERO,
        }
    }

    /// Fixed-interval policy sized to cover `timeout`.
    ///
    /// A zero interval degrades to a single probe.
    pub fn within(timeout: Duration, interval: Duration) -> Self {
        let attempts = if interval.is_zero() {
            1
        } else {
            timeout.as_millis().div_ceil(interval.as_millis()).max(1) as usize
        };
        Self::fixed(attempts, interval)
    }

    /// Sleep duration after the given 1-based failed attempt.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1).min(31) as u32;
        let factor = self.multiplier.max(1).saturating_pow(exp);
        let mut delay = self.base_delay.saturating_mul(factor);
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        if self.jitter.is_zero() {
            return delay;
        }
        let jitter_ms: u64 = rng().random_range(0..=self.jitter.as_millis() as u64);
        delay + Duration::from_millis(jitter_ms)
    }

    /// Run `probe` until it yields `Some` or the attempts are exhausted.
    ///
    /// `probe` receives the 1-based attempt number. There is no sleep after
    /// the final attempt.
    #[instrument(level = "debug", skip_all, fields(max_attempts = self.max_attempts))]
    pub async fn poll<T, F, Fut>(&self, mut probe: F) -> Option<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let t0 = Instant::now();
        for attempt in 1..=self.max_attempts {
            if let Some(value) = probe(attempt).await {
                debug!(attempt, elapsed_ms = t0.elapsed().as_millis() as u64, "poll satisfied");
                return Some(value);
            }
            if attempt < self.max_attempts {
                sleep(self.delay_for(attempt)).await;
            }
        }
        debug!(
            attempts = self.max_attempts,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "poll exhausted"
        );
        None
    }
}
