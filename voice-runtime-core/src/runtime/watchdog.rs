//! Bounded calls to operations that may hang.
//!
//! The operation runs on its own task. The caller waits at most `timeout`;
//! after that the task is abandoned, not killed: it keeps running until it
//! finishes on its own and its result is dropped.

use std::future::Future;
use std::time::Duration;

use crate::models::error::VoiceError;

/// Run `operation` on a spawned task and wait at most `timeout` for it.
///
/// Returns `TimedOut` when the deadline passes and `ServiceUnavailable` when
/// the task panicked.
pub async fn bounded<F, T>(label: &str, timeout: Duration, operation: F) -> Result<T, VoiceError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(operation);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => {
            log::error!("{} task failed: {}", label, join_error);
            Err(VoiceError::ServiceUnavailable(format!("{} task failed", label)))
        }
        Err(_) => {
            // Dropping the JoinHandle detaches the task.
            log::warn!("{} did not finish within {:?}; abandoning it", label, timeout);
            Err(VoiceError::TimedOut)
        }
    }
}

/// `bounded` for operations that already return `Result<T, VoiceError>`.
pub async fn bounded_try<F, T>(label: &str, timeout: Duration, operation: F) -> Result<T, VoiceError>
where
    F: Future<Output = Result<T, VoiceError>> + Send + 'static,
    T: Send + 'static,
{
    bounded(label, timeout, operation).await?
}

/// Run a blocking closure on the blocking pool with the same deadline
/// semantics as `bounded`.
pub async fn bounded_blocking<F, T>(label: &str, timeout: Duration, operation: F) -> Result<T, VoiceError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(operation);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => {
            log::error!("{} blocking task failed: {}", label, join_error);
            Err(VoiceError::ServiceUnavailable(format!("{} task failed", label)))
        }
        Err(_) => {
            log::warn!("{} did not finish within {:?}; abandoning it", label, timeout);
            Err(VoiceError::TimedOut)
        }
    }
}
