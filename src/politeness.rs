use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Minimum per-origin delay with random jitter, applied between page loads
/// and between listing navigations. Even a future multi-session setup must
/// keep one of these per origin.
#[derive(Debug, Clone, Copy)]
pub struct Politeness {
    pub min_delay: Duration,
    pub jitter: Duration,
}

impl Default for Politeness {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(2),
            jitter: Duration::from_secs(3),
        }
    }
}

impl Politeness {
    pub fn new(min_delay: Duration, jitter: Duration) -> Self {
        Self { min_delay, jitter }
    }

    /// No waiting at all, for tests and offline replays.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn pick(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.min_delay + Duration::from_millis(extra)
    }

    /// Sleep before touching the origin again.
    pub async fn pause(&self) {
        let delay = self.pick();
        if delay.is_zero() {
            return;
        }
        debug!("Waiting {:?} before the next request", delay);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picked_delay_stays_within_bounds() {
        let p = Politeness::new(Duration::from_millis(100), Duration::from_millis(50));
        for _ in 0..20 {
            let d = p.pick();
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(150));
        }
    }

    #[tokio::test]
    async fn none_returns_immediately() {
        Politeness::none().pause().await;
    }
}
