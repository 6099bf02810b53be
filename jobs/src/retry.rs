//! Bounded retry with a fixed interval.
//!
//! Chain operations themselves are at-most-once-attempted and never retried
//! internally; this helper exists for the one place retrying is sound —
//! polling for state that another actor is expected to create, such as a
//! proxy relationship that appears after identity bootstrap. The attempt cap
//! bounds total waiting time; dropping the future cancels the wait.

use std::future::Future;
use std::time::Duration;

/// Run `op` until it succeeds, sleeping `interval` between attempts, giving
/// up with the last error after `max_attempts`. Always attempts at least
/// once.
pub async fn bounded<T, E, F, Fut>(interval: Duration, max_attempts: u32, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(e);
                }
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn returns_first_success() {
        let calls = Cell::new(0u32);
        let result: Result<u32, ()> = bounded(Duration::from_millis(1), 5, || {
            calls.set(calls.get() + 1);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Cell::new(0u32);
        let result: Result<u32, &str> = bounded(Duration::from_millis(1), 5, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err("not yet")
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempt_cap() {
        let calls = Cell::new(0u32);
        let result: Result<(), &str> = bounded(Duration::from_millis(1), 4, || {
            calls.set(calls.get() + 1);
            async { Err("still failing") }
        })
        .await;
        assert_eq!(result, Err("still failing"));
        assert_eq!(calls.get(), 4);
    }
}
