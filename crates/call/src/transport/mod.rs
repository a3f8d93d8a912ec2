//! The collaborator that actually moves bytes.
//!
//! Sockets, TLS, pooling and the wire format all live behind [`Transport`]. A call hands the
//! transport its request together with the call's [`Timeout`], and runs the returned future under
//! that same timeout, so canceling the call drops the in-flight exchange.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::protocol::{Request, Response, TransportError};
use crate::timeout::Timeout;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: Request, timeout: Timeout) -> Result<Response, TransportError>;
}

/// A [`Transport`] backed by an async closure.
pub struct TransportFn<F> {
    f: F,
}

impl<F> fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(Request, Timeout) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, TransportError>> + Send,
{
    async fn send(&self, request: Request, timeout: Timeout) -> Result<Response, TransportError> {
        (self.f)(request, timeout).await
    }
}

pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(Request, Timeout) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, TransportError>> + Send,
{
    TransportFn { f }
}
