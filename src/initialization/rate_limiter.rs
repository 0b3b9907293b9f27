//! Rate limiter initialization.
//!
//! This module provides a token-bucket rate limiter that provider clients use to
//! pace their outgoing requests.

use std::sync::Arc;

use tokio::sync::Semaphore as TokioSemaphore;
use tokio::time::{interval, Duration as TokioDuration};
use tokio_util::sync::CancellationToken;

/// Token-bucket rate limiter for controlling request rate.
///
/// Tokens are replenished at a fixed rate (requests per second) by a background
/// task. Each request consumes a token and waits when the bucket is empty. The
/// bucket never holds more than `capacity` tokens, which bounds bursts.
pub struct RateLimiter {
    permits: Arc<TokioSemaphore>,
    capacity: usize,
    rps: u32,
    shutdown: CancellationToken,
}

impl RateLimiter {
    /// Waits for a token and consumes it.
    pub async fn acquire(&self) {
        // The semaphore is never closed, so acquire only fails after shutdown
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }

    /// Configured requests per second.
    pub fn rps(&self) -> u32 {
        self.rps
    }

    /// Burst size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently available without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Initializes a token-bucket rate limiter.
///
/// Returns `None` when `rps` is 0 (rate limiting disabled). The bucket starts
/// full with `burst` tokens (at least one). Dropping the limiter stops its
/// replenishment task.
///
/// Must be called from within a Tokio runtime.
pub fn init_rate_limiter(rps: u32, burst: usize) -> Option<Arc<RateLimiter>> {
    if rps == 0 {
        return None;
    }
    let capacity = burst.max(1);
    let shutdown = CancellationToken::new();

    let limiter = Arc::new(RateLimiter {
        permits: Arc::new(TokioSemaphore::new(capacity)),
        capacity,
        rps,
        shutdown: shutdown.clone(),
    });

    let permits = Arc::clone(&limiter.permits);
    // Fast ticker (every 100ms); the permits added are proportional to elapsed time
    let mut ticker = interval(TokioDuration::from_millis(100));
    tokio::spawn(async move {
        let mut last_time = tokio::time::Instant::now();
        let mut fractional_permits = 0.0f64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = tokio::time::Instant::now();
                    let elapsed = now.duration_since(last_time);
                    last_time = now;

                    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let due = f64::from(rps) * elapsed.as_secs_f64() + fractional_permits;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let whole = due as usize;
                    #[allow(clippy::cast_precision_loss)]
                    {
                        fractional_permits = due - whole as f64;
                    }

                    let room = capacity.saturating_sub(permits.available_permits());
                    let to_add = whole.min(room);
                    if to_add > 0 {
                        permits.add_permits(to_add);
                    }
                    if room == 0 {
                        fractional_permits = 0.0;
                    }
                }
                _ = shutdown.cancelled() => {
                    log::debug!("Rate limiter background task shutting down");
                    break;
                }
            }
        }
    });

    Some(limiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_init_rate_limiter_disabled() {
        assert!(
            init_rate_limiter(0, 10).is_none(),
            "Rate limiter should be disabled when RPS is 0"
        );
    }

    #[tokio::test]
    async fn test_init_rate_limiter_enabled() {
        let limiter = init_rate_limiter(10, 20).expect("enabled when RPS > 0");
        assert_eq!(limiter.rps(), 10);
        assert_eq!(limiter.capacity(), 20);
        assert_eq!(limiter.available(), 20);
    }

    #[tokio::test]
    async fn test_rate_limiter_consumes_tokens() {
        let limiter = init_rate_limiter(1, 3).unwrap();

        for _ in 0..3 {
            let acquired = timeout(Duration::from_millis(10), limiter.acquire()).await;
            assert!(acquired.is_ok(), "burst capacity should be usable immediately");
        }

        // Bucket is empty and 1 RPS will not refill within 50ms
        let blocked = timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err(), "empty bucket should block");
    }

    #[tokio::test]
    async fn test_rate_limiter_token_replenishment() {
        let limiter = init_rate_limiter(10, 1).unwrap();
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_millis(250)).await;

        let acquired = timeout(Duration::from_millis(100), limiter.acquire()).await;
        assert!(
            acquired.is_ok(),
            "Should be able to acquire permit after token replenishment"
        );
    }

    #[tokio::test]
    async fn test_rate_limiter_never_exceeds_capacity() {
        let limiter = init_rate_limiter(100, 2).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test]
    async fn test_zero_burst_still_allows_one_request() {
        let limiter = init_rate_limiter(5, 0).unwrap();
        assert_eq!(limiter.capacity(), 1);
        let acquired = timeout(Duration::from_millis(10), limiter.acquire()).await;
        assert!(acquired.is_ok());
    }
}
