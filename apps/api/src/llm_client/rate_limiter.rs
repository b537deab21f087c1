//! Rolling-window admission control for generation calls.
//!
//! One limiter instance is shared by every call site (it lives inside `LlmClient`).
//! A caller over the budget sleeps until the oldest admission leaves the window;
//! it is never rejected. The admission is recorded at the moment it is granted, so a
//! call that later fails still consumes budget and cannot be retried in a tight loop.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

pub struct RateLimiter {
    max_requests: usize,
    per: Duration,
    admissions: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// `max_requests` is clamped to at least 1 so a waiter can always be admitted eventually.
    pub fn new(max_requests: usize, per: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            per,
            admissions: Mutex::new(VecDeque::with_capacity(max_requests.max(1))),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.per
    }

    /// Waits until a slot is free in the current window, then records the admission.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.try_admit(Instant::now()) {
                Ok(()) => return,
                Err(wait) => wait,
            };
            warn!(
                wait_ms = wait.as_millis() as u64,
                max_requests = self.max_requests,
                window_secs = self.per.as_secs(),
                "Rate limiter: pausing generation call"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Single admission check. Prunes and admits under one lock so interleaved callers
    /// can never overshoot the window. Returns how long to wait when the window is full.
    fn try_admit(&self, now: Instant) -> Result<(), Duration> {
        let mut admissions = self
            .admissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        prune(&mut admissions, now, self.per);

        if admissions.len() < self.max_requests {
            admissions.push_back(now);
            debug!(
                in_window = admissions.len(),
                max_requests = self.max_requests,
                "Rate limiter: admitted"
            );
            return Ok(());
        }

        let oldest = admissions.front().copied().unwrap_or(now);
        let elapsed = now.saturating_duration_since(oldest);
        Err(self.per.saturating_sub(elapsed).max(Duration::from_millis(1)))
    }

    /// Number of admissions still inside the window ending now.
    pub fn admissions_in_window(&self) -> usize {
        let mut admissions = self
            .admissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        prune(&mut admissions, Instant::now(), self.per);
        admissions.len()
    }
}

fn prune(admissions: &mut VecDeque<Instant>, now: Instant, per: Duration) {
    while let Some(&oldest) = admissions.front() {
        if now.saturating_duration_since(oldest) >= per {
            admissions.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn max_in_any_window(times: &[Instant], per: Duration) -> usize {
        times
            .iter()
            .map(|start| {
                times
                    .iter()
                    .filter(|t| **t >= *start && t.saturating_duration_since(*start) < per)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_admits_up_to_max_without_waiting() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now(), start, "first burst must not sleep");
        assert_eq!(limiter.admissions_in_window(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fourth_call_waits_for_window_to_roll() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        let waited = Instant::now().duration_since(start);
        assert!(
            waited >= Duration::from_secs(10),
            "fourth admission should wait a full window, waited {waited:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_never_exceeds_window_bound() {
        let per = Duration::from_secs(60);
        let limiter = RateLimiter::new(14, per);
        let mut times = Vec::new();
        for _ in 0..50 {
            limiter.acquire().await;
            times.push(Instant::now());
        }
        assert!(max_in_any_window(&times, per) <= 14);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_budget() {
        let per = Duration::from_secs(5);
        let limiter = Arc::new(RateLimiter::new(2, per));
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            set.spawn(async move {
                limiter.acquire().await;
                Instant::now()
            });
        }
        let mut times = Vec::new();
        while let Some(res) = set.join_next().await {
            times.push(res.expect("task panicked"));
        }
        assert_eq!(times.len(), 8);
        assert!(max_in_any_window(&times, per) <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_admissions_are_pruned() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        limiter.acquire().await;
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(limiter.admissions_in_window(), 0);
    }

    #[test]
    fn test_zero_max_requests_is_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));
        assert_eq!(limiter.max_requests(), 1);
    }
}
