use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use micro_call::call::Call;
use micro_call::protocol::{CallError, Request, Response, TransportError};
use serde::de::DeserializeOwned;

use crate::error::ServiceError;
use crate::service_call::read_reply;
use crate::service_method::MethodPlan;

/// An enqueued call, resolving to its adapted result.
///
/// The exchange runs on the dispatcher whether or not this future is polled; the body is read
/// and converted by whoever awaits it. Dropping it abandons the result but not the exchange,
/// use [`PendingResult::cancel`] for that.
pub struct PendingResult<T> {
    call: Arc<dyn Call>,
    method: String,
    future: BoxFuture<'static, Result<T, ServiceError>>,
}

impl<T> PendingResult<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(
        call: Arc<dyn Call>,
        plan: Arc<MethodPlan>,
        completion: oneshot::Receiver<Result<Response, CallError>>,
    ) -> Self {
        let method = plan.name().to_string();
        let future = async move {
            let response = match completion.await {
                Ok(result) => result?,
                Err(oneshot::Canceled) => {
                    return Err(TransportError::interrupted("call completed without reporting a result").into());
                }
            };
            Ok::<T, ServiceError>(read_reply(plan.converter, response).await?.into_result()?)
        }
        .boxed();

        Self { call, method, future }
    }
}

impl<T> PendingResult<T> {
    pub fn request(&self) -> &Request {
        self.call.request()
    }

    pub fn cancel(&self) {
        self.call.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.call.is_canceled()
    }
}

impl<T> Future for PendingResult<T> {
    type Output = Result<T, ServiceError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for PendingResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResult").field("method", &self.method).field("call", &self.call).finish_non_exhaustive()
    }
}
