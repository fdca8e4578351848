use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Sliding-window request throttle: at most `max_requests` acquisitions in
/// any trailing `window`. Shared across concurrent callers via `Arc`.
///
/// The timestamp queue is the only state shared between tasks. A caller that
/// must wait computes its deadline under the lock, releases it, sleeps, then
/// re-enters the loop, so other callers keep evicting and acquiring while it
/// sleeps, and the mutex makes the final push atomic with the re-check.
#[derive(Debug)]
pub struct RequestThrottle {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RequestThrottle {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        assert!(max_requests > 0, "throttle needs at least one slot");
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Suspends until one more request may be issued, then records it.
    /// Worst-case wait is bounded by `window`; never fails.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut stamps = self.timestamps.lock().await;
                let now = Instant::now();
                while stamps
                    .front()
                    .is_some_and(|&t| now.duration_since(t) >= self.window)
                {
                    stamps.pop_front();
                }

                if stamps.len() < self.max_requests {
                    stamps.push_back(now);
                    return;
                }

                // Oldest retained entry ages out at front + window.
                *stamps.front().expect("queue at capacity") + self.window - now
            };
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn burst_within_limit_does_not_wait() {
        let throttle = RequestThrottle::new(5, WINDOW);
        let started = Instant::now();
        for _ in 0..5 {
            throttle.acquire().await;
        }
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn next_call_waits_for_oldest_to_age_out() {
        let throttle = RequestThrottle::new(3, WINDOW);
        for _ in 0..3 {
            throttle.acquire().await;
        }

        let started = Instant::now();
        throttle.acquire().await;
        let waited = started.elapsed();
        assert!(waited >= WINDOW, "waited {waited:?}, expected >= {WINDOW:?}");
        assert!(waited < WINDOW + Duration::from_secs(1), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn staggered_calls_wait_only_for_their_slot() {
        let throttle = RequestThrottle::new(2, WINDOW);
        throttle.acquire().await;
        tokio::time::advance(Duration::from_secs(20)).await;
        throttle.acquire().await;

        // Both slots taken; the first frees up 40s from now.
        let started = Instant::now();
        throttle.acquire().await;
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(40), "waited {waited:?}");
        assert!(waited < Duration::from_secs(41), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_never_exceed_the_cap() {
        let throttle = Arc::new(RequestThrottle::new(5, WINDOW));
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let t = Arc::clone(&throttle);
            handles.push(tokio::spawn(async move {
                t.acquire().await;
                Instant::now()
            }));
        }

        let mut finish_times = Vec::new();
        for h in handles {
            finish_times.push(h.await.unwrap());
        }
        finish_times.sort();

        // First five proceed immediately, the rest only after the window turns over.
        assert_eq!(finish_times[4].duration_since(started), Duration::ZERO);
        assert!(finish_times[5].duration_since(started) >= WINDOW);

        // No trailing window ever saw more than five acquisitions.
        for pair in finish_times.windows(6) {
            assert!(pair[5].duration_since(pair[0]) >= WINDOW);
        }
    }
}
