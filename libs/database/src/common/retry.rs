use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff for reaching the database at startup.
///
/// Request-path statements are never retried; a failed transaction surfaces
/// to the caller as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    /// Retries after the first attempt
    pub retries: u32,
    pub first_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Shrink each wait to a random 50-100% of its nominal value
    pub jitter: bool,
}

impl Default for Backoff {
    /// 5 retries, 200ms doubling up to 5s, jittered.
    fn default() -> Self {
        Self {
            retries: 5,
            first_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            factor: 2.0,
            jitter: true,
        }
    }
}

impl Backoff {
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn first_delay(mut self, delay: Duration) -> Self {
        self.first_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Nominal waits between attempts, before jitter.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.first_delay.min(self.max_delay)), |prev| {
            Some(prev.mul_f64(self.factor).min(self.max_delay))
        })
        .take(self.retries as usize)
    }
}

/// Run `attempt` until it succeeds or the policy's retries are spent; the
/// last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(mut attempt: F, policy: &Backoff) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delays = policy.delays();
    let mut tries = 1u32;

    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Some(delay) = delays.next() else {
            warn!(tries, error = %err, "Giving up");
            return Err(err);
        };
        let wait = if policy.jitter { jittered(delay) } else { delay };
        debug!(tries, error = %err, wait_ms = wait.as_millis() as u64, "Attempt failed, retrying");
        tokio::time::sleep(wait).await;
        tries += 1;
    }
}

fn jittered(delay: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let percent = 50 + RandomState::new().hash_one(std::time::SystemTime::now()) % 51;
    delay.mul_f64(percent as f64 / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick() -> Backoff {
        Backoff::default()
            .first_delay(Duration::from_millis(1))
            .without_jitter()
    }

    #[test]
    fn test_delays_double_and_cap() {
        let policy = Backoff::default()
            .retries(4)
            .first_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(300));
        let delays: Vec<u128> = policy.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 300, 300]);
    }

    #[tokio::test]
    async fn test_recovers_once_the_database_is_up() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("refused {n}")) } else { Ok(n) }
            },
            &quick(),
        )
        .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn test_returns_last_error_when_exhausted() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("refused {n}"))
            },
            &quick().retries(2),
        )
        .await;
        assert_eq!(result, Err("refused 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_jitter_stays_within_half_to_full() {
        for _ in 0..20 {
            let wait = jittered(Duration::from_millis(1000)).as_millis();
            assert!((500..=1000).contains(&wait), "{wait}");
        }
    }
}
