//! Cancelable deadlines shared between a call and its transport.
//!
//! A [`Timeout`] is a handle: clones observe and drive the same cancellation flag and limits.
//! The call keeps one clone and passes another to the transport, so canceling from either side
//! unblocks everything running under [`Timeout::run`].

use std::future::{Future, pending};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::protocol::TransportError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Limits {
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct Timeout {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    limits: ArcSwap<Limits>,
    token: CancellationToken,
}

impl Timeout {
    /// A timeout with no limits that has not been canceled.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_limits(Limits { timeout: Some(timeout), deadline: None })
    }

    fn with_limits(limits: Limits) -> Self {
        Self { inner: Arc::new(Inner { limits: ArcSwap::from_pointee(limits), token: CancellationToken::new() }) }
    }

    /// Returns a new, uncanceled timeout carrying the same limits.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self::with_limits(**self.inner.limits.load())
    }

    /// Limits how long a single run may take, measured from the moment it starts.
    pub fn set_timeout(&self, timeout: Duration) {
        self.inner.limits.rcu(|limits| Limits { timeout: Some(timeout), ..**limits });
    }

    pub fn clear_timeout(&self) {
        self.inner.limits.rcu(|limits| Limits { timeout: None, ..**limits });
    }

    /// Sets an absolute point in time after which runs fail with [`TransportError::TimedOut`].
    pub fn set_deadline(&self, deadline: Instant) {
        self.inner.limits.rcu(|limits| Limits { deadline: Some(deadline), ..**limits });
    }

    pub fn clear_deadline(&self) {
        self.inner.limits.rcu(|limits| Limits { deadline: None, ..**limits });
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.limits.load().timeout
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.limits.load().deadline
    }

    /// The instant a run started at `start` expires: the earlier of `start + timeout` and the deadline.
    pub fn expires_at(&self, start: Instant) -> Option<Instant> {
        let limits = self.inner.limits.load();
        let relative = limits.timeout.and_then(|timeout| start.checked_add(timeout));
        match (relative, limits.deadline) {
            (Some(relative), Some(deadline)) => Some(relative.min(deadline)),
            (relative, deadline) => relative.or(deadline),
        }
    }

    /// Idempotent. Every clone sees the cancellation.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes once [`Timeout::cancel`] has been called on any clone.
    pub async fn canceled(&self) {
        self.inner.token.cancelled().await;
    }

    /// Drives `future` until it completes, the timeout is canceled or the limits expire.
    ///
    /// Cancellation wins over a simultaneous expiry, and both win over a future that becomes
    /// ready in the same poll.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, TransportError> {
        if self.is_canceled() {
            return Err(TransportError::Canceled);
        }

        let expiry = self.expires_at(Instant::now());
        let expired = async move {
            match expiry {
                Some(at) => sleep_until(at).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.inner.token.cancelled() => Err(TransportError::Canceled),
            () = expired => Err(TransportError::TimedOut),
            output = future => Ok(output),
        }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::new()
    }
}
