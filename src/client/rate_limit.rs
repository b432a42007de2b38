//! Token-bucket rate limiting shared by all outgoing requests
//!
//! The bucket refills one token per `interval` up to `burst` tokens. Admission
//! reserves a token immediately (the balance may go negative) and then sleeps
//! off the deficit, so concurrent callers are admitted in arrival order.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::cancel::Cancellation;

/// Rate limit setting for a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimit {
    /// No client-side rate limiting
    Disabled,
    /// One request per `interval`, with up to `burst` requests admitted at once
    PerInterval {
        /// Time to refill a single token
        interval: Duration,
        /// Bucket capacity
        burst: u32,
    },
}

impl RateLimit {
    /// Build the limiter for this setting, or `None` when disabled.
    pub fn build(self) -> Option<RateLimiter> {
        match self {
            RateLimit::Disabled => None,
            RateLimit::PerInterval { interval, burst } => Some(RateLimiter::new(interval, burst)),
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Internally synchronized token bucket
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    burst: u32,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a full bucket
    ///
    /// # Arguments
    /// * `interval` - Time to refill one token; zero means unlimited
    /// * `burst` - Maximum tokens held at once (at least 1)
    pub fn new(interval: Duration, burst: u32) -> Self {
        let burst = burst.max(1);
        Self {
            interval,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(burst),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Refill interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Bucket capacity
    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Wait for admission of one request
    ///
    /// Returns [`RateLimitError::Cancelled`] as soon as `cancel` fires; a token
    /// reserved by a cancelled wait is handed back to the bucket.
    pub async fn acquire(&self, cancel: &Cancellation) -> Result<(), RateLimitError> {
        if cancel.is_cancelled() {
            return Err(RateLimitError::Cancelled);
        }

        let wait = self.reserve()?;
        if wait.is_zero() {
            return Ok(());
        }

        trace!("Rate limiter delaying request by {:?}", wait);
        tokio::select! {
            _ = sleep(wait) => Ok(()),
            _ = cancel.cancelled() => {
                self.release()?;
                Err(RateLimitError::Cancelled)
            }
        }
    }

    /// Take a token without waiting. Returns `false` if none is available.
    pub fn try_acquire(&self) -> Result<bool, RateLimitError> {
        if self.interval.is_zero() {
            return Ok(true);
        }
        let mut bucket = self.lock()?;
        self.refill(&mut bucket);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Reserve a token and return how long the caller must wait for it.
    fn reserve(&self) -> Result<Duration, RateLimitError> {
        if self.interval.is_zero() {
            return Ok(Duration::ZERO);
        }
        let mut bucket = self.lock()?;
        self.refill(&mut bucket);
        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 {
            Ok(Duration::ZERO)
        } else {
            Ok(self.interval.mul_f64(-bucket.tokens))
        }
    }

    fn release(&self) -> Result<(), RateLimitError> {
        let mut bucket = self.lock()?;
        bucket.tokens = (bucket.tokens + 1.0).min(f64::from(self.burst));
        Ok(())
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let earned = elapsed.as_secs_f64() / self.interval.as_secs_f64();
        bucket.tokens = (bucket.tokens + earned).min(f64::from(self.burst));
        bucket.last_refill = now;
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Bucket>, RateLimitError> {
        self.bucket.lock().map_err(|_| RateLimitError::Poisoned)
    }
}

/// Rate limiter errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateLimitError {
    /// Admission wait was cancelled
    #[error("rate limiter wait cancelled")]
    Cancelled,

    /// Bucket state is unusable after a panic in another caller
    #[error("rate limiter state poisoned")]
    Poisoned,
}
