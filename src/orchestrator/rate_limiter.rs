use std::future::Future;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between the completion of one call and the
/// start of the next.
///
/// The lock is held for the whole call, so concurrent callers are paced one
/// after another across the process.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    last_wall: RwLock<Option<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
            last_wall: RwLock::new(None),
        }
    }

    /// Wait out the remaining interval, run `call`, then record its completion.
    ///
    /// The timestamp is updated whether the call succeeded or not.
    pub async fn throttle<F, T>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last = self.last_call.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?} before next call", wait);
                tokio::time::sleep(wait).await;
            }
        }

        let output = call.await;

        *last = Some(Instant::now());
        if let Ok(mut wall) = self.last_wall.write() {
            *wall = Some(Utc::now());
        }
        output
    }

    /// Wall-clock time of the last completed call, if any.
    pub fn last_call_at(&self) -> Option<DateTime<Utc>> {
        self.last_wall.read().ok().and_then(|wall| *wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_call_is_not_delayed() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.throttle(async {}).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(limiter.last_call_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_secs(1));

        let first_done = limiter.throttle(async { Instant::now() }).await;
        let second_start = limiter.throttle(async { Instant::now() }).await;

        assert!(second_start - first_done >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_counts_from_completion() {
        let limiter = RateLimiter::new(Duration::from_secs(1));

        let first_done = limiter
            .throttle(async {
                tokio::time::sleep(Duration::from_millis(700)).await;
                Instant::now()
            })
            .await;
        let second_start = limiter.throttle(async { Instant::now() }).await;

        assert!(second_start - first_done >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_when_interval_already_passed() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.throttle(async {}).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let start = Instant::now();
        limiter.throttle(async {}).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(500)));
        let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = limiter.clone();
            let stamps = stamps.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .throttle(async {
                        stamps.lock().unwrap().push(Instant::now());
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut stamps = stamps.lock().unwrap().clone();
        stamps.sort();
        assert_eq!(stamps.len(), 3);
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
    }
}
