//! Bounded retry for operations whose contract allows a fixed attempt count.
//!
//! The identity fetch during bootstrap is allowed exactly two attempts with
//! no backoff; rather than duplicating call sites, the bound and the
//! operation are parameters here.

use std::future::Future;

use crate::error::{Error, Result};

/// Run `op` up to `max_attempts` times, returning the first success.
///
/// `on_failure` is invoked with the 1-based attempt number and the error
/// after every failed attempt, including the last; the final error is
/// returned once the bound is exhausted. No delay is inserted between
/// attempts.
///
/// # Errors
///
/// Returns the last attempt's error, or a validation error when
/// `max_attempts` is zero.
pub async fn with_attempts<T, F, Fut, D>(
    max_attempts: u32,
    mut op: F,
    mut on_failure: D,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    D: FnMut(u32, &Error),
{
    let mut last = None;
    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                on_failure(attempt, &err);
                last = Some(err);
            }
        }
    }
    Err(last.unwrap_or_else(|| Error::validation("retry requires at least one attempt", None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing_until(
        succeed_on: u32,
    ) -> (
        Arc<AtomicU32>,
        impl FnMut() -> Pin<Box<dyn Future<Output = Result<u32>>>>,
    ) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let op = move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n >= succeed_on {
                    Ok(n)
                } else {
                    Err(Error::timeout(format!("attempt {n} failed")))
                }
            }) as Pin<Box<dyn Future<Output = Result<u32>>>>
        };
        (calls, op)
    }

    #[tokio::test]
    async fn first_attempt_success_makes_one_call() {
        let (calls, op) = failing_until(1);
        let value = with_attempts(2, op, |_, _| {}).await.unwrap();
        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_attempt_success_is_returned_normally() {
        let (calls, op) = failing_until(2);
        let mut failures = Vec::new();
        let value = with_attempts(2, op, |attempt, _| failures.push(attempt))
            .await
            .unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(failures, vec![1]);
    }

    #[tokio::test]
    async fn bound_exhausted_makes_no_third_attempt() {
        let (calls, op) = failing_until(10);
        let mut failures = Vec::new();
        let err = with_attempts(2, op, |attempt, _| failures.push(attempt))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("attempt 2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(failures, vec![1, 2]);
    }

    #[tokio::test]
    async fn zero_attempts_is_an_error() {
        let (calls, op) = failing_until(1);
        let err = with_attempts(0, op, |_, _| {}).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
