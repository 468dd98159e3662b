use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{error, warn};

/// How many times a provider HTTP call is repeated after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            interval: Duration::from_millis(2000),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Run `action`, repeating it while it fails with [`Error::is_transient`].
pub(crate) async fn retry_transient<T, A, Fut>(
    policy: RetryPolicy,
    provider: &str,
    action: A,
) -> Result<T>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let strategy = FixedInterval::new(policy.interval).take(policy.max_retries);

    RetryIf::spawn(strategy, action, |e: &Error| {
        let transient = e.is_transient();
        if transient {
            warn!("{} call failed: {}. Will retry...", provider, e);
        }
        transient
    })
    .await
    .map_err(|e| {
        error!("{} call failed: {}", provider, e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(max_retries).with_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_success() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result = retry_transient(fast(2), "Test", move || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::ProviderStatus {
                    status: 503,
                    body: "busy".to_string(),
                })
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result: Result<()> = retry_transient(fast(3), "Test", move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(Error::ProviderStatus {
                status: 400,
                body: "bad request".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result: Result<()> = retry_transient(fast(1), "Test", move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(Error::ProviderStatus {
                status: 429,
                body: String::new(),
            })
        })
        .await;

        assert!(matches!(result, Err(Error::ProviderStatus { status: 429, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
