//! Helpers for awaiting broadcast events in async tests.

use std::time::Duration;
use tokio::sync::broadcast;

/// Default wait used by event assertions.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Next event from `rx`, or `None` if nothing arrives within `timeout`.
/// Lagged receivers skip ahead rather than failing.
pub async fn recv_within<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    timeout: Duration,
) -> Option<T> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(event)) => return Some(event),
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return None,
        }
    }
}

/// Wait until `rx` yields an event matching `pred`.
pub async fn wait_for<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    timeout: Duration,
    pred: impl Fn(&T) -> bool,
) -> Option<T> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let event = recv_within(rx, remaining).await?;
        if pred(&event) {
            return Some(event);
        }
    }
}
