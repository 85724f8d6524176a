//! Stage retry policy and backoff computation (spec §4.4.1, §4.4.6, §9).

use chrono::Duration;
use rand::Rng;

/// How a failed stage is retried (spec §4.4.1 "retry").
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retryable: Option<std::sync::Arc<dyn Fn(&str) -> bool + Send + Sync>>,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_frac: f64,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("retryable", &self.retryable.is_some())
            .field("min_backoff", &self.min_backoff)
            .field("max_backoff", &self.max_backoff)
            .field("jitter_frac", &self.jitter_frac)
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            retryable: None,
            min_backoff: Duration::seconds(1),
            max_backoff: Duration::seconds(30),
            jitter_frac: 0.20,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts, ..Self::default() }
    }

    pub fn min_backoff(mut self, d: Duration) -> Self {
        self.min_backoff = d;
        self
    }

    pub fn max_backoff(mut self, d: Duration) -> Self {
        self.max_backoff = d;
        self
    }

    pub fn jitter_frac(mut self, frac: f64) -> Self {
        self.jitter_frac = frac;
        self
    }

    pub fn retryable(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.retryable = Some(std::sync::Arc::new(f));
        self
    }

    /// Whether another attempt is admitted after `attempts` completed
    /// attempts and the given error text (spec §4.4.6; boundary: `max_attempts
    /// = 0` falls out of `attempts < max_attempts` directly — the first
    /// failure is already terminal).
    pub fn admits_retry(&self, attempts: u32, error: &str) -> bool {
        if attempts >= self.max_attempts {
            return false;
        }
        self.retryable.as_ref().map(|f| f(error)).unwrap_or(true)
    }

    /// Compute the backoff delay for the attempt just completed (1-indexed),
    /// with symmetric jitter, using the given random source (spec §4.4.6,
    /// §9 "randomness MUST be per-row").
    pub fn backoff_for(&self, attempts: u32, rng: &mut impl Rng) -> Duration {
        let exponent = attempts.saturating_sub(1).min(30);
        let scale = 2u64.saturating_pow(exponent);
        let base = self.min_backoff * scale as i32;
        let capped = base.min(self.max_backoff);

        if self.jitter_frac <= 0.0 {
            return capped;
        }
        let capped_ms = capped.num_milliseconds() as f64;
        let width = capped_ms * self.jitter_frac;
        let offset = rng.gen_range(-width..=width);
        let jittered_ms = (capped_ms + offset).max(0.0);
        Duration::milliseconds(jittered_ms as i64)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
