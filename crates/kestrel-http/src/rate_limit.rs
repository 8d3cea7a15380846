//! Rate limiting for outgoing requests
//!
//! Every dispatch takes one token before it reaches a transport. A client
//! without a configured rate uses [`Unlimited`], which never blocks.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::{
    config::RateLimit,
    error::{HttpError, Result},
};

/// Gate that a request passes through before it is sent
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait for one token.
    ///
    /// Returns [`HttpError::Cancelled`] if `cancel` fires first; no token is
    /// consumed in that case.
    async fn wait(&self, cancel: &CancellationToken) -> Result<()>;
}

/// Limiter that lets everything through
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(HttpError::Cancelled);
        }
        Ok(())
    }
}

/// Token bucket rate limiter
///
/// Tokens are added at a fixed rate up to the burst capacity, and the bucket
/// starts full. A waiter reserves its token up front, letting the balance go
/// negative, and then sleeps off the deficit. Reservations are taken under
/// the lock, so tokens are issued in the order callers arrived.
#[derive(Debug)]
pub struct TokenBucket {
    /// Tokens per second (refill rate)
    tokens_per_second: f64,
    /// Maximum tokens in bucket (burst capacity)
    max_tokens: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a new token bucket limiter
    ///
    /// # Arguments
    /// * `tokens_per_second` - Rate at which tokens are added (e.g., 10 for 10 requests/sec)
    /// * `burst` - Maximum tokens in bucket; zero is raised to one
    pub fn new(tokens_per_second: f64, burst: u32) -> Self {
        let max_tokens = f64::from(burst.max(1));
        Self {
            tokens_per_second,
            max_tokens,
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Refill tokens based on elapsed time
    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.tokens_per_second).min(self.max_tokens);
        state.last_refill = now;
    }

    /// Take a token now if one is available
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Get current token count (negative while reservations are outstanding)
    pub fn current_tokens(&self) -> f64 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens
    }

    /// Get time until the next token is available
    pub fn time_until_available(&self) -> Duration {
        let mut state = self.state.lock();
        self.refill(&mut state);
        self.deficit(state.tokens - 1.0)
    }

    /// Claim a token and report how long the caller must wait for it
    fn reserve(&self) -> Duration {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens -= 1.0;
        self.deficit(state.tokens)
    }

    /// Hand an unused reservation back
    fn release(&self) {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens = (state.tokens + 1.0).min(self.max_tokens);
    }

    fn deficit(&self, balance: f64) -> Duration {
        // A rate that never refills degrades to no limit rather than an endless wait
        if balance >= 0.0 || !(self.tokens_per_second.is_finite() && self.tokens_per_second > 0.0) {
            Duration::ZERO
        } else {
            // Rates too small to express as a Duration wait forever
            Duration::try_from_secs_f64(-balance / self.tokens_per_second).unwrap_or(Duration::MAX)
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        let delay = self.reserve();
        if delay.is_zero() {
            return Ok(());
        }

        trace!("Waiting {:?} for rate limiter token", delay);
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = cancel.cancelled() => {
                self.release();
                Err(HttpError::Cancelled)
            }
        }
    }
}

/// Build the limiter described by a config entry
pub fn limiter_for(limit: Option<RateLimit>) -> Arc<dyn RateLimiter> {
    match limit {
        Some(limit) if limit.is_bounded() => {
            Arc::new(TokenBucket::new(limit.rate, limit.burst))
        }
        _ => Arc::new(Unlimited),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(actual: Duration, expected: Duration) -> bool {
        let slack = Duration::from_millis(5);
        actual + slack >= expected && actual <= expected + slack
    }

    #[tokio::test]
    async fn test_unlimited_never_blocks() {
        let limiter = Unlimited;
        let token = CancellationToken::new();
        for _ in 0..1000 {
            limiter.wait(&token).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_unlimited_reports_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let result = Unlimited.wait(&token).await;
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_throttle() {
        let bucket = TokenBucket::new(10.0, 3);
        let token = CancellationToken::new();
        let start = Instant::now();

        for _ in 0..3 {
            bucket.wait(&token).await.unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        bucket.wait(&token).await.unwrap();
        assert!(within(start.elapsed(), Duration::from_millis(100)));

        bucket.wait(&token).await.unwrap();
        assert!(within(start.elapsed(), Duration::from_millis(200)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_acquire_and_refill() {
        let bucket = TokenBucket::new(2.0, 1);
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
        assert!(within(bucket.time_until_available(), Duration::from_millis(500)));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(bucket.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_capped_at_burst() {
        let bucket = TokenBucket::new(100.0, 2);
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!((bucket.current_tokens() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_burst_is_raised_to_one() {
        let bucket = TokenBucket::new(1.0, 0);
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_returns_token() {
        let bucket = Arc::new(TokenBucket::new(1.0, 1));
        let token = CancellationToken::new();
        bucket.wait(&token).await.unwrap();

        let waiter = {
            let bucket = bucket.clone();
            let token = token.clone();
            tokio::spawn(async move { bucket.wait(&token).await })
        };
        tokio::task::yield_now().await;
        token.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(HttpError::Cancelled)));
        assert!(bucket.time_until_available() <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiny_rate_waits_without_overflow() {
        let bucket = Arc::new(TokenBucket::new(1e-20, 1));
        let token = CancellationToken::new();
        bucket.wait(&token).await.unwrap();
        assert_eq!(bucket.time_until_available(), Duration::MAX);

        let waiter = {
            let bucket = bucket.clone();
            let token = token.clone();
            tokio::spawn(async move { bucket.wait(&token).await })
        };
        tokio::task::yield_now().await;
        token.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }

    #[tokio::test]
    async fn test_limiter_for_unbounded_rate() {
        let limiter = limiter_for(Some(RateLimit::new(0.0, 5)));
        let token = CancellationToken::new();
        for _ in 0..100 {
            limiter.wait(&token).await.unwrap();
        }
    }
}
