//! Request cancellation handles

use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a request was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// Cancelled by the caller.
    Requested(String),
    /// The request outlived its timeout.
    TimedOut(Duration),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested(reason) if reason.is_empty() => f.write_str("cancelled"),
            Self::Requested(reason) => write!(f, "cancelled: {}", reason),
            Self::TimedOut(after) => write!(f, "timed out after {}ms", after.as_millis()),
        }
    }
}

/// A cloneable handle that cancels an in-flight request.
///
/// Clones share state. A handle may carry a deadline, after which it counts
/// as cancelled with [`CancelReason::TimedOut`], and may be linked to a
/// parent: cancelling the parent cancels the child with the parent's reason.
/// The first reason recorded wins.
///
/// # Example
///
/// ```ignore
/// let handle = CancelHandle::new();
/// let request = RequestConfig::get("/plans").cancel_with(handle.clone());
///
/// tokio::spawn(client.send(request));
/// handle.cancel(CancelReason::Requested("page closed".into()));
/// ```
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<CancelHandleInner>,
}

struct CancelHandleInner {
    token: CancellationToken,
    reason: OnceLock<CancelReason>,
    deadline: Option<(Instant, Duration)>,
    parent: Option<CancelHandle>,
}

impl CancelHandle {
    /// Creates a handle with no deadline.
    pub fn new() -> Self {
        Self::from_parts(CancellationToken::new(), None, None)
    }

    /// Creates a handle that times out `timeout` from now.
    pub fn with_deadline(timeout: Duration) -> Self {
        Self::from_parts(CancellationToken::new(), Some(timeout), None)
    }

    /// Creates a handle that is cancelled whenever `parent` is.
    ///
    /// The child may carry its own deadline; timing out does not cancel the
    /// parent.
    pub fn linked_to(parent: &CancelHandle, timeout: Option<Duration>) -> Self {
        Self::from_parts(parent.inner.token.child_token(), timeout, Some(parent.clone()))
    }

    fn from_parts(
        token: CancellationToken,
        timeout: Option<Duration>,
        parent: Option<CancelHandle>,
    ) -> Self {
        Self {
            inner: Arc::new(CancelHandleInner {
                token,
                reason: OnceLock::new(),
                deadline: timeout.map(|after| (Instant::now() + after, after)),
                parent,
            }),
        }
    }

    /// Cancels the handle.
    ///
    /// Does nothing if the handle is already cancelled.
    pub fn cancel(&self, reason: CancelReason) {
        if self.inner.token.is_cancelled() {
            return;
        }
        log::debug!("cancelling request: {}", reason);
        let _ = self.inner.reason.set(reason);
        self.inner.token.cancel();
    }

    /// Returns `true` if the handle was cancelled or its deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.fire_if_expired();
        self.inner.token.is_cancelled()
    }

    /// Returns the cancellation reason, or `None` while not cancelled.
    pub fn reason(&self) -> Option<CancelReason> {
        if !self.is_cancelled() {
            return None;
        }
        self.inner
            .reason
            .get()
            .cloned()
            .or_else(|| self.inner.parent.as_ref().and_then(CancelHandle::reason))
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline.map(|(at, _)| at)
    }

    /// Returns the timeout the deadline was derived from, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.deadline.map(|(_, after)| after)
    }

    /// Returns `true` if both handles share state.
    pub fn same_handle(&self, other: &CancelHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Waits until the handle is cancelled or times out.
    ///
    /// Deadlines of linked parents are honoured as well.
    pub async fn cancelled(&self) -> CancelReason {
        loop {
            match self.earliest_deadline() {
                Some(at) => {
                    tokio::select! {
                        _ = self.inner.token.cancelled() => break,
                        _ = tokio::time::sleep_until(at) => {
                            self.fire_if_expired();
                            if self.inner.token.is_cancelled() {
                                break;
                            }
                        }
                    }
                }
                None => {
                    self.inner.token.cancelled().await;
                    break;
                }
            }
        }
        self.reason()
            .unwrap_or_else(|| CancelReason::Requested(String::new()))
    }

    fn earliest_deadline(&self) -> Option<Instant> {
        let parent = self
            .inner
            .parent
            .as_ref()
            .and_then(CancelHandle::earliest_deadline);
        match (self.deadline(), parent) {
            (Some(own), Some(parent)) => Some(own.min(parent)),
            (own, parent) => own.or(parent),
        }
    }

    // Parents first, so a parent timeout reaches the child with the parent's
    // reason.
    fn fire_if_expired(&self) {
        if let Some(parent) = &self.inner.parent {
            parent.fire_if_expired();
        }
        if let Some((at, after)) = self.inner.deadline {
            if Instant::now() >= at {
                self.cancel(CancelReason::TimedOut(after));
            }
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.inner.token.is_cancelled())
            .field("reason", &self.inner.reason.get())
            .field("timeout", &self.timeout())
            .field("linked", &self.inner.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested(reason: &str) -> CancelReason {
        CancelReason::Requested(reason.to_string())
    }

    #[test]
    fn test_cancel_records_first_reason() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());
        assert_eq!(handle.reason(), None);

        handle.cancel(requested("first"));
        handle.cancel(requested("second"));
        assert!(handle.is_cancelled());
        assert_eq!(handle.reason(), Some(requested("first")));
    }

    #[test]
    fn test_clones_share_state() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        clone.cancel(requested("closed"));
        assert!(handle.is_cancelled());
        assert!(handle.same_handle(&clone));
        assert!(!handle.same_handle(&CancelHandle::new()));
    }

    #[test]
    fn test_parent_cancel_propagates_reason() {
        let parent = CancelHandle::new();
        let child = CancelHandle::linked_to(&parent, Some(Duration::from_secs(5)));
        assert!(!child.is_cancelled());

        parent.cancel(requested("user left"));
        assert!(child.is_cancelled());
        assert_eq!(child.reason(), Some(requested("user left")));
    }

    #[test]
    fn test_child_cancel_leaves_parent() {
        let parent = CancelHandle::new();
        let child = CancelHandle::linked_to(&parent, None);
        child.cancel(requested("done"));
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_fires_timed_out() {
        let handle = CancelHandle::with_deadline(Duration::from_millis(20));
        assert_eq!(handle.timeout(), Some(Duration::from_millis(20)));
        let reason = handle.cancelled().await;
        assert_eq!(reason, CancelReason::TimedOut(Duration::from_millis(20)));
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_deadline_reaches_child() {
        let parent = CancelHandle::with_deadline(Duration::from_millis(10));
        let child = CancelHandle::linked_to(&parent, Some(Duration::from_secs(60)));
        let reason = child.cancelled().await;
        assert_eq!(reason, CancelReason::TimedOut(Duration::from_millis(10)));
        assert!(parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_on_cancel() {
        let handle = CancelHandle::with_deadline(Duration::from_secs(60));
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        handle.cancel(requested("stop"));
        assert_eq!(task.await.unwrap(), requested("stop"));
    }

    #[test]
    fn test_display() {
        assert_eq!(requested("").to_string(), "cancelled");
        assert_eq!(requested("page closed").to_string(), "cancelled: page closed");
        assert_eq!(
            CancelReason::TimedOut(Duration::from_millis(60000)).to_string(),
            "timed out after 60000ms"
        );
    }
}
