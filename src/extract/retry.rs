use std::thread;
use std::time::Duration;
use tracing::debug;

/// Bounded retry with a fixed backoff.
///
/// Dynamic pages detach elements between query and read; the cure is to
/// re-query against a fresh snapshot a few times before giving the field up
/// as absent. The policy is injected into extraction call sites so it can be
/// tested without a browser.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(400),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Run `op` until it yields a value or the attempt budget is spent.
    pub fn run<T>(&self, mut op: impl FnMut() -> Option<T>) -> Option<T> {
        for attempt in 1..=self.max_attempts {
            if let Some(value) = op() {
                return Some(value);
            }
            if attempt < self.max_attempts {
                debug!("attempt {}/{} came up empty, retrying", attempt, self.max_attempts);
                if !self.backoff.is_zero() {
                    thread::sleep(self.backoff);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO)
    }

    #[test]
    fn first_success_short_circuits() {
        let mut calls = 0;
        let got = policy().run(|| {
            calls += 1;
            Some(7)
        });
        assert_eq!(got, Some(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn succeeds_on_a_later_attempt() {
        let mut calls = 0;
        let got = policy().run(|| {
            calls += 1;
            (calls == 3).then_some("ok")
        });
        assert_eq!(got, Some("ok"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_the_budget() {
        let mut calls = 0;
        let got: Option<()> = policy().run(|| {
            calls += 1;
            None
        });
        assert_eq!(got, None);
        assert_eq!(calls, 3);
    }

    #[test]
    fn at_least_one_attempt_even_when_misconfigured() {
        let mut calls = 0;
        let got: Option<()> = RetryPolicy::new(0, Duration::ZERO).run(|| {
            calls += 1;
            None
        });
        assert_eq!(got, None);
        assert_eq!(calls, 1);
    }
}
