//! Transport retry with exponential backoff.
//!
//! Retry lives at the transport layer only: the upload engine and retrieval
//! catalog see a single blocking call that either completes or fails. Only
//! transport failures are retried; a server rejection is an answer, not an
//! outage.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use super::traits::ProtocolError;

/// Attempts before giving up and surfacing the transport error.
const MAX_RETRIES: u32 = 4;

/// Backoff cap between attempts.
const MAX_BACKOFF_SECS: u64 = 30;

/// Retry an operation with exponential backoff (1, 2, 4, 8... seconds,
/// capped). Returns the last error once retries are exhausted.
pub async fn retry_with_backoff<F, Fut, T>(mut operation: F) -> Result<T, ProtocolError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProtocolError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !is_retryable(&err) || attempt >= MAX_RETRIES {
                    return Err(err);
                }

                let backoff_secs = 2u64.pow(attempt).min(MAX_BACKOFF_SECS);
                tracing::warn!(
                    attempt = attempt + 1,
                    backoff_secs,
                    error = %err,
                    "transport attempt failed, retrying"
                );
                sleep(Duration::from_secs(backoff_secs)).await;
                attempt += 1;
            }
        }
    }
}

/// Only transport failures are transient.
pub fn is_retryable(err: &ProtocolError) -> bool {
    matches!(err, ProtocolError::Transport(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_immediately_without_retry() {
        let result = retry_with_backoff(|| async { Ok::<_, ProtocolError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transport_failures_until_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = retry_with_backoff(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ProtocolError::Transport("flaky".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: Result<(), _> = retry_with_backoff(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ProtocolError::Rejected("QUOTA_EXCEEDED".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retryable_classification() {
        assert!(is_retryable(&ProtocolError::Transport("t".into())));
        assert!(!is_retryable(&ProtocolError::Rejected("r".into())));
        assert!(!is_retryable(&ProtocolError::Malformed("m".into())));
    }
}
