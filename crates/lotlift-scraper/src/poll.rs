//! Fixed-interval polling for elements that render asynchronously.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::ScraperError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(150);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

#[cfg(test)]
impl PollConfig {
    pub(crate) fn from_millis(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

/// Call `probe` every `config.interval` until it yields a value or
/// `config.timeout` has elapsed. The probe always runs at least once.
///
/// # Errors
///
/// Returns [`ScraperError::Timeout`] naming `what` when the probe never
/// succeeds in time.
pub async fn poll_until<T, F>(
    config: PollConfig,
    what: &str,
    mut probe: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Option<T>,
{
    let started = Instant::now();
    let deadline = started + config.timeout;
    loop {
        if let Some(found) = probe() {
            return Ok(found);
        }
        let now = Instant::now();
        if now >= deadline {
            let waited_ms =
                u64::try_from(now.duration_since(started).as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(what, waited_ms, "poll timed out");
            return Err(ScraperError::Timeout {
                what: what.to_string(),
                waited_ms,
            });
        }
        tokio::time::sleep(config.interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn returns_as_soon_as_probe_succeeds() {
        let mut calls = 0;
        let found = poll_until(PollConfig::default(), "form", || {
            calls += 1;
            (calls == 3).then_some("ready")
        })
        .await
        .unwrap();
        assert_eq!(found, "ready");
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_descriptive_error() {
        let config = PollConfig::from_millis(100, 1_000);
        let mut calls = 0;
        let err = poll_until(config, "title input", || {
            calls += 1;
            None::<()>
        })
        .await
        .unwrap_err();
        match err {
            ScraperError::Timeout { what, waited_ms } => {
                assert_eq!(what, "title input");
                assert!(waited_ms >= 1_000);
            }
            other => panic!("unexpected error: {other}"),
        }
        // One probe at t=0 plus one per elapsed interval.
        assert!((10..=11).contains(&calls), "calls = {calls}");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_probes_once() {
        let mut calls = 0;
        let result = poll_until(PollConfig::from_millis(150, 0), "photos input", || {
            calls += 1;
            None::<()>
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
