use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use futures::channel::oneshot;
use http::{HeaderMap, StatusCode};
use micro_call::call::Call;
use micro_call::protocol::{Request, Response, ResponseHead};
use micro_call::timeout::Timeout;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::converter::ConverterKind;
use crate::error::{AdaptationError, ServiceError};
use crate::pending::PendingResult;
use crate::service_method::MethodPlan;

/// A typed [`Call`]: same single-use contract, with the response adapted to `T`.
pub struct ServiceCall<T> {
    call: Arc<dyn Call>,
    plan: Arc<MethodPlan>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceCall<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(call: Box<dyn Call>, plan: Arc<MethodPlan>) -> Self {
        Self { call: Arc::from(call), plan, _marker: PhantomData }
    }

    pub fn request(&self) -> &Request {
        self.call.request()
    }

    /// Executes the call and converts a 2xx response. Any other status fails with
    /// [`AdaptationError::UnexpectedStatus`].
    pub async fn execute(&self) -> Result<T, ServiceError> {
        Ok(self.execute_reply().await?.into_result()?)
    }

    /// Executes the call and keeps non-2xx responses as data instead of failing.
    pub async fn execute_reply(&self) -> Result<Reply<T>, ServiceError> {
        let response = self.call.execute().await?;
        let reply = read_reply(self.plan.converter, response).await?;
        if !reply.is_successful() {
            debug!(method = self.plan.name(), status = %reply.status(), "unexpected status");
        }
        Ok(reply)
    }

    /// Enqueues the call on the dispatcher. The returned future resolves to the adapted result.
    pub fn enqueue(&self) -> Result<PendingResult<T>, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.call.enqueue(Box::new(move |result| {
            // the receiver is gone when the caller dropped the pending result
            let _ = tx.send(result);
        }))?;
        Ok(PendingResult::new(Arc::clone(&self.call), Arc::clone(&self.plan), rx))
    }

    pub fn cancel(&self) {
        self.call.cancel();
    }

    pub fn is_executed(&self) -> bool {
        self.call.is_executed()
    }

    pub fn is_canceled(&self) -> bool {
        self.call.is_canceled()
    }

    pub fn timeout(&self) -> &Timeout {
        self.call.timeout()
    }

    /// A new, unexecuted call for the same request.
    #[must_use]
    pub fn clone_call(&self) -> Self {
        Self::new(self.call.clone_call(), Arc::clone(&self.plan))
    }

    /// The underlying untyped call.
    pub fn raw(&self) -> &dyn Call {
        self.call.as_ref()
    }
}

impl<T> fmt::Debug for ServiceCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCall").field("method", &self.plan.name()).field("call", &self.call).finish()
    }
}

/// A completed exchange with its body adapted: the converted value for 2xx statuses, the raw
/// error body otherwise.
#[derive(Debug)]
pub struct Reply<T> {
    head: ResponseHead,
    request: Request,
    outcome: Result<T, Bytes>,
}

impl<T> Reply<T> {
    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn is_successful(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn body(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error_body(&self) -> Option<&Bytes> {
        self.outcome.as_ref().err()
    }

    pub fn into_body(self) -> Option<T> {
        self.outcome.ok()
    }

    pub fn into_result(self) -> Result<T, AdaptationError> {
        let status = self.status();
        self.outcome.map_err(|body| AdaptationError::UnexpectedStatus { status, body })
    }
}

/// Reads the body and converts it when the status is 2xx. 204 and 205 carry no content and
/// convert from nothing.
pub(crate) async fn read_reply<T: DeserializeOwned>(
    converter: ConverterKind,
    response: Response,
) -> Result<Reply<T>, AdaptationError> {
    let (head, body, request) = response.into_parts();
    let status = head.status();

    let outcome = if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) {
        body.close();
        Ok(ConverterKind::empty()?)
    } else {
        let bytes = body.bytes().await?;
        if status.is_success() { Ok(converter.convert(bytes)?) } else { Err(bytes) }
    };

    Ok(Reply { head, request, outcome })
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use micro_call::protocol::{Request, Response};
    use serde::Deserialize;

    use super::read_reply;
    use crate::converter::ConverterKind;
    use crate::error::AdaptationError;

    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        id: u64,
    }

    fn response(status: StatusCode, body: &'static str) -> Response {
        let request = Request::builder().uri("https://api.example.test/users/42").build().unwrap();
        Response::builder(request).status(status).body(body).unwrap()
    }

    #[tokio::test]
    async fn success_is_converted() {
        let reply = read_reply::<User>(ConverterKind::Json, response(StatusCode::OK, r#"{"id":42}"#)).await.unwrap();
        assert!(reply.is_successful());
        assert_eq!(reply.body(), Some(&User { id: 42 }));
        assert_eq!(reply.request().uri().path(), "/users/42");
        assert_eq!(reply.into_result().unwrap(), User { id: 42 });
    }

    #[tokio::test]
    async fn error_status_keeps_body() {
        let reply = read_reply::<User>(ConverterKind::Json, response(StatusCode::NOT_FOUND, "no such user")).await.unwrap();
        assert!(!reply.is_successful());
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert_eq!(reply.error_body().map(|body| body.as_ref()), Some(&b"no such user"[..]));

        let AdaptationError::UnexpectedStatus { status, body } = reply.into_result().unwrap_err() else {
            panic!("expected an unexpected status");
        };
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.as_ref(), b"no such user");
    }

    #[tokio::test]
    async fn no_content() {
        let reply = read_reply::<Option<User>>(ConverterKind::Json, response(StatusCode::NO_CONTENT, "")).await.unwrap();
        assert_eq!(reply.into_body(), Some(None));

        let error = read_reply::<User>(ConverterKind::Json, response(StatusCode::NO_CONTENT, "")).await.unwrap_err();
        assert!(matches!(error, AdaptationError::Decode { .. }));
    }

    #[tokio::test]
    async fn undecodable_success() {
        let error = read_reply::<User>(ConverterKind::Json, response(StatusCode::OK, "<html>")).await.unwrap_err();
        assert!(matches!(error, AdaptationError::Decode { .. }));
    }
}
