//! Generic poll-until-terminal driver shared by `Order::wait_until_ready`,
//! `Order::wait_for_completion`, `Authorization`, and `Challenge`.
//!
//! The driver never transitions resource state itself — it calls a
//! caller-supplied refresh action, hands the result to a predicate, and
//! sleeps between attempts. Whatever the server last reported is what gets
//! returned.

use crate::error::{AcmeError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const BACKOFF_MULTIPLIER: f64 = 1.5;

/// A cancellation signal a caller can hold onto and trigger from another
/// task to abort an in-progress poll loop.
pub struct Cancellation {
    tx: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn new() -> (Self, CancellationToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancellationToken { rx })
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    async fn wait_for_cancellation(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                // Sender dropped without cancelling: never resolves.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Polls `refresh` until `is_terminal` accepts its result or `timeout`
/// elapses. `refresh` returns the latest resource value plus an optional
/// server-suggested `Retry-After` duration; `describe` renders a short
/// status string used only for the `Interrupted`/`Timeout` error context.
///
/// Backoff starts at 3s, is multiplied by 1.5 after each non-terminal poll,
/// and is capped at 30s; a server `Retry-After` longer than the current
/// backoff wins.
pub async fn poll_until<T, F, Fut>(
    resource: &str,
    mut refresh: F,
    mut is_terminal: impl FnMut(&T) -> bool,
    describe: impl Fn(&T) -> String,
    timeout: Duration,
    mut cancellation: Option<CancellationToken>,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, Option<Duration>)>>,
{
    let deadline = Instant::now() + timeout;
    let mut backoff = DEFAULT_BACKOFF;
    let mut last_status: Option<String> = None;

    loop {
        let (value, retry_after) = refresh().await?;
        last_status = Some(describe(&value));

        if is_terminal(&value) {
            return Ok(value);
        }

        if Instant::now() >= deadline {
            return Err(AcmeError::Timeout {
                resource: resource.to_string(),
                last_status,
            });
        }

        let sleep_for = retry_after.map(|d| d.max(backoff)).unwrap_or(backoff);

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {}
            _ = wait_for_cancellation(&mut cancellation) => {
                return Err(AcmeError::Interrupted {
                    resource: resource.to_string(),
                    last_status,
                });
            }
        }

        backoff = Duration::from_secs_f64((backoff.as_secs_f64() * BACKOFF_MULTIPLIER).min(MAX_BACKOFF.as_secs_f64()));
    }
}

async fn wait_for_cancellation(cancellation: &mut Option<CancellationToken>) {
    match cancellation {
        Some(token) => token.wait_for_cancellation().await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_as_soon_as_predicate_accepts() {
        let calls = AtomicU32::new(0);
        let result = poll_until(
            "order",
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AcmeError>((n, None))
            },
            |n: &u32| *n >= 2,
            |n| n.to_string(),
            Duration::from_secs(60),
            None,
        )
        .await
        .unwrap();
        assert_eq!(result, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_carrying_last_status() {
        let result = poll_until(
            "order",
            || async { Ok::<_, AcmeError>(("pending".to_string(), None)) },
            |_: &String| false,
            |s| s.clone(),
            Duration::from_secs(5),
            None,
        )
        .await;
        match result {
            Err(AcmeError::Timeout { resource, last_status }) => {
                assert_eq!(resource, "order");
                assert_eq!(last_status.as_deref(), Some("pending"));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let (cancel, token) = Cancellation::new();
        cancel.cancel();
        let result = poll_until(
            "authz",
            || async { Ok::<_, AcmeError>(("pending".to_string(), None)) },
            |_: &String| false,
            |s| s.clone(),
            Duration::from_secs(60),
            Some(token),
        )
        .await;
        assert!(matches!(result, Err(AcmeError::Interrupted { .. })));
    }
}
