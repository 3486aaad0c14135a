//! Retry Policy and Rate Limiting
//!
//! The two wrappers around every external classification call: a bounded
//! retry policy with exponential backoff and jitter, and a token-bucket
//! rate limiter that replaces fixed inter-call sleeps while still
//! respecting an external quota.

use anyhow::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Run an operation with bounded retries. Backoff doubles per attempt,
    /// capped at `max_delay`, with multiplicative jitter in [0.5, 1.0] so
    /// concurrent workers don't retry in lockstep.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    let exp = self
                        .base_delay
                        .saturating_mul(2u32.saturating_pow(attempt - 1))
                        .min(self.max_delay);
                    let jitter = rand::thread_rng().gen_range(0.5..=1.0);
                    let delay = exp.mul_f64(jitter);
                    warn!(
                        "Attempt {}/{} failed ({}); retrying in {:?}",
                        attempt, self.max_attempts, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Token-bucket rate limiter for calls against an external quota.
///
/// `acquire` consumes a token, sleeping until the next refill when the
/// bucket is empty, so callers serialize against the quota without fixed
/// per-call delays.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

struct TokenBucket {
    tokens: u32,
    max_tokens: u32,
    last_refill: Instant,
    refill_interval: Duration,
}

impl TokenBucket {
    fn refill(&mut self) {
        let elapsed = self.last_refill.elapsed();
        let refills = (elapsed.as_secs_f64() / self.refill_interval.as_secs_f64()) as u32;
        if refills > 0 {
            self.tokens = (self.tokens + refills).min(self.max_tokens);
            self.last_refill = Instant::now();
        }
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

impl RateLimiter {
    /// A bucket of `max_tokens` tokens, regaining one token every
    /// `refill_interval`.
    pub fn new(max_tokens: u32, refill_interval: Duration) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket {
                tokens: max_tokens,
                max_tokens,
                last_refill: Instant::now(),
                refill_interval,
            }),
        }
    }

    /// Consume one token, waiting for a refill if necessary.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                if bucket.try_consume() {
                    return;
                }
                bucket
                    .refill_interval
                    .saturating_sub(bucket.last_refill.elapsed())
            };
            tokio::time::sleep(wait.max(Duration::from_millis(10))).await;
        }
    }
}
