//! Bounded polling for state that appears eventually.
//!
//! ```text
//! probe() ──► Some(v) ─────────────────────► Ok(Some(v))
//!    │
//!    ├──► Err(e) ──────────────────────────► Err(e)
//!    │
//!    └──► None ──► attempts left? ── no ───► Ok(None)
//!                      │ yes
//!                      ▼
//!                 sleep(next backoff) ──► probe() again
//! ```

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Upper bound on a single wait between probes.
const MAX_INTERVAL: Duration = Duration::from_secs(5);

/// Polls `probe` until it yields `Some`, fails, or `max_attempts` probes
/// have run.
///
/// Waits grow exponentially from `initial_interval`. Returns `Ok(None)`
/// when every attempt came back empty. A probe error stops the loop at
/// once and is returned unchanged.
///
/// ## Example
/// ```rust,ignore
/// let user = await_condition(
///     || users.find_by_auth_id(&sub),
///     5,
///     Duration::from_millis(200),
/// )
/// .await?;
/// ```
pub async fn await_condition<T, E, F, Fut>(
    mut probe: F,
    max_attempts: u32,
    initial_interval: Duration,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let mut backoff = create_backoff(initial_interval);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }

        if attempt >= max_attempts {
            debug!(attempts = attempt, "Condition not met, giving up");
            return Ok(None);
        }

        match backoff.next_backoff() {
            Some(duration) => {
                debug!(?duration, attempt, "Condition not met, waiting");
                tokio::time::sleep(duration).await;
            }
            None => return Ok(None),
        }
    }
}

fn create_backoff(initial_interval: Duration) -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: initial_interval,
        initial_interval,
        max_interval: MAX_INTERVAL.max(initial_interval),
        multiplier: 2.0,
        // Attempts bound the loop, not wall time
        max_elapsed_time: None,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    const TICK: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn test_returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<Option<&str>, String> = await_condition(
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(if n == 3 { Some("ready") } else { None })
                }
            },
            5,
            TICK,
        )
        .await;

        assert_eq!(result.unwrap(), Some("ready"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<Option<()>, String> = await_condition(
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            },
            4,
            TICK,
        )
        .await;

        assert_eq!(result.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_probe_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<Option<()>, String> = await_condition(
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("store down".to_string())
                }
            },
            5,
            TICK,
        )
        .await;

        assert_eq!(result.unwrap_err(), "store down");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_sleep() {
        let started = std::time::Instant::now();

        let result: Result<Option<()>, String> =
            await_condition(|| async { Ok(None) }, 1, Duration::from_secs(10)).await;

        assert_eq!(result.unwrap(), None);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
