use std::convert::identity;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, Span, debug, info_span, warn};

use crate::call::state::StateCell;
use crate::call::{Call, CallState, Callback};
use crate::client::Client;
use crate::protocol::{CallError, Request, Response, TransportError};
use crate::timeout::Timeout;

/// The [`Call`] created by [`Client`]: runs its request through the client's transport, and
/// its enqueued executions on the client's dispatcher.
pub struct HttpCall {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    request: Request,
    timeout: Timeout,
    state: StateCell,
}

impl HttpCall {
    pub(crate) fn new(client: Client, request: Request) -> Self {
        let timeout = client.new_timeout();
        Self { inner: Arc::new(Inner { client, request, timeout, state: StateCell::new() }) }
    }

    pub fn state(&self) -> CallState {
        self.inner.state.load()
    }
}

impl Inner {
    fn begin(&self) -> Result<(), CallError> {
        self.state.start().map_err(|state| match state {
            CallState::CanceledIdle => CallError::illegal_state("call was canceled before execution"),
            _ => CallError::illegal_state("already executed"),
        })
    }

    fn span(&self) -> Span {
        info_span!("call", method = %self.request.method(), uri = %self.request.uri())
    }

    async fn perform(&self) -> Result<Response, TransportError> {
        debug!("start exchange");
        let exchange = self.client.transport().send(self.request.clone(), self.timeout.clone());
        let result = self.timeout.run(exchange).await.and_then(identity);
        self.complete(&result);
        result
    }

    fn complete(&self, result: &Result<Response, TransportError>) {
        let outcome = match result {
            Ok(_) => CallState::Succeeded,
            Err(TransportError::Canceled) => CallState::Canceled,
            Err(_) => CallState::Failed,
        };

        if !self.state.finish(outcome) {
            return;
        }

        match result {
            Ok(response) => debug!(status = %response.status(), "exchange completed"),
            Err(TransportError::Canceled) => debug!("exchange canceled"),
            Err(e) => warn!(cause = %e, "exchange failed"),
        }
    }
}

/// Ends an in-place execution whose future the caller dropped before it completed.
struct Abandon<'a> {
    inner: &'a Inner,
}

impl Drop for Abandon<'_> {
    fn drop(&mut self) {
        // a no-op once `complete` has recorded the outcome
        if self.inner.state.finish(CallState::Canceled) {
            self.inner.timeout.cancel();
            debug!(uri = %self.inner.request.uri(), "execution abandoned by caller");
        }
    }
}

/// Hands the result of an enqueued call to its callback, or a failure if the dispatcher drops
/// the task first.
struct Completion {
    inner: Arc<Inner>,
    callback: Option<Callback>,
}

impl Completion {
    fn deliver(mut self, result: Result<Response, CallError>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            let result = Err(TransportError::interrupted("call was dropped by the dispatcher before completing"));
            self.inner.complete(&result);
            callback(result.map_err(CallError::from));
        }
    }
}

#[async_trait]
impl Call for HttpCall {
    fn request(&self) -> &Request {
        &self.inner.request
    }

    async fn execute(&self) -> Result<Response, CallError> {
        self.inner.begin()?;
        let _abandon = Abandon { inner: &self.inner };
        let span = self.inner.span();
        self.inner.perform().instrument(span).await.map_err(CallError::from)
    }

    fn enqueue(&self, callback: Callback) -> Result<(), CallError> {
        self.inner.begin()?;

        let inner = Arc::clone(&self.inner);
        let completion = Completion { inner: Arc::clone(&inner), callback: Some(callback) };
        let span = inner.span();

        debug!(parent: &span, "enqueue call");
        self.inner.client.dispatcher().dispatch(Box::pin(
            async move {
                // a cancel that landed while queued makes `perform` fail before the transport runs
                let result = inner.perform().await;
                completion.deliver(result.map_err(CallError::from));
            }
            .instrument(span),
        ));
        Ok(())
    }

    fn cancel(&self) {
        loop {
            match self.inner.state.load() {
                CallState::Created => {
                    if self.inner.state.cancel_idle().is_ok() {
                        self.inner.timeout.cancel();
                        debug!(uri = %self.inner.request.uri(), "canceled before execution");
                        return;
                    }
                }
                CallState::Executing => {
                    self.inner.timeout.cancel();
                    return;
                }
                _ => return,
            }
        }
    }

    fn is_executed(&self) -> bool {
        self.inner.state.load().is_executed()
    }

    fn is_canceled(&self) -> bool {
        self.inner.state.load() == CallState::CanceledIdle || self.inner.timeout.is_canceled()
    }

    fn timeout(&self) -> &Timeout {
        &self.inner.timeout
    }

    fn clone_call(&self) -> Box<dyn Call> {
        Box::new(HttpCall::new(self.inner.client.clone(), self.inner.request.clone()))
    }
}

impl fmt::Debug for HttpCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCall")
            .field("method", self.inner.request.method())
            .field("uri", self.inner.request.uri())
            .field("state", &self.inner.state.load())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use futures::channel::oneshot;
    use http::{Method, StatusCode};
    use proptest::prelude::*;

    use super::HttpCall;
    use crate::call::{Call, CallFactory, CallState, Callback};
    use crate::client::Client;
    use crate::dispatcher::{DispatchTask, Dispatcher};
    use crate::protocol::{CallError, Request, Response, TransportError};
    use crate::timeout::Timeout;
    use crate::transport::{MockTransport, transport_fn};

    fn request() -> Request {
        Request::builder().method(Method::GET).uri("https://api.example.test/users/42").build().unwrap()
    }

    fn ok(request: Request) -> Result<Response, TransportError> {
        Response::builder(request).status(StatusCode::OK).body(r#"{"id":42}"#).map_err(TransportError::protocol)
    }

    fn counting_client(count: Arc<AtomicUsize>) -> Client {
        Client::builder()
            .transport(transport_fn(move |request: Request, _timeout: Timeout| {
                count.fetch_add(1, Ordering::SeqCst);
                async move { ok(request) }
            }))
            .build()
            .unwrap()
    }

    fn hanging_client() -> Client {
        Client::builder()
            .transport(transport_fn(|_request: Request, _timeout: Timeout| async {
                std::future::pending::<Result<Response, TransportError>>().await
            }))
            .build()
            .unwrap()
    }

    fn callback() -> (Callback, oneshot::Receiver<Result<Response, CallError>>) {
        let (tx, rx) = oneshot::channel();
        let callback: Callback = Box::new(move |result| {
            let _ = tx.send(result);
        });
        (callback, rx)
    }

    /// Holds tasks until released, so tests can act while an enqueued call waits.
    #[derive(Default)]
    struct HeldDispatcher {
        tasks: Mutex<Vec<DispatchTask>>,
    }

    impl HeldDispatcher {
        fn release(&self) {
            let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
            for task in tasks {
                tokio::spawn(task);
            }
        }

        fn discard(&self) {
            self.tasks.lock().unwrap().clear();
        }
    }

    impl Dispatcher for Arc<HeldDispatcher> {
        fn dispatch(&self, task: DispatchTask) {
            self.tasks.lock().unwrap().push(task);
        }
    }

    #[tokio::test]
    async fn execute_returns_response() {
        let count = Arc::new(AtomicUsize::new(0));
        let client = counting_client(Arc::clone(&count));
        let call = client.new_call(request());

        assert!(!call.is_executed());
        let response = call.execute().await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.request(), call.request());
        assert!(call.is_executed());
        assert!(!call.is_canceled());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execute_twice_is_illegal() {
        let count = Arc::new(AtomicUsize::new(0));
        let client = counting_client(Arc::clone(&count));
        let call = client.new_call(request());

        let first = call.execute().await.unwrap();
        let second = call.execute().await.unwrap_err();

        assert!(second.is_illegal_state());
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.bytes().await.unwrap().as_ref(), br#"{"id":42}"#);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn enqueue_after_execute_is_illegal() {
        let client = counting_client(Arc::new(AtomicUsize::new(0)));
        let call = client.new_call(request());
        call.execute().await.unwrap();

        let (callback, _rx) = callback();
        assert!(call.enqueue(callback).unwrap_err().is_illegal_state());
    }

    #[tokio::test]
    async fn execute_after_enqueue_is_illegal() {
        let client = counting_client(Arc::new(AtomicUsize::new(0)));
        let call = client.new_call(request());

        let (callback, rx) = callback();
        call.enqueue(callback).unwrap();
        assert!(call.is_executed());
        assert!(call.execute().await.unwrap_err().is_illegal_state());

        let response = rx.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_, _| Err(TransportError::connect("connection refused")));
        let client = Client::builder().transport(transport).build().unwrap();

        let call = client.new_call(request());
        let error = call.execute().await.unwrap_err();

        assert!(matches!(error.as_transport(), Some(TransportError::Connect { .. })));
        assert!(call.is_executed());
    }

    #[tokio::test]
    async fn transport_sees_call_timeout() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|_, timeout| timeout.timeout() == Some(Duration::from_secs(3)))
            .times(1)
            .returning(|request, _| ok(request));
        let client = Client::builder().transport(transport).call_timeout(Duration::from_secs(3)).build().unwrap();

        client.new_call(request()).execute().await.unwrap();
    }

    #[tokio::test]
    async fn call_timeout_expires() {
        let client = Client::builder()
            .transport(transport_fn(|_request: Request, _timeout: Timeout| async {
                std::future::pending::<Result<Response, TransportError>>().await
            }))
            .call_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let error = client.new_call(request()).execute().await.unwrap_err();
        assert!(error.as_transport().is_some_and(TransportError::is_timed_out));
    }

    #[tokio::test]
    async fn cancel_before_execute() {
        let count = Arc::new(AtomicUsize::new(0));
        let client = counting_client(Arc::clone(&count));
        let call = client.new_call(request());

        call.cancel();

        assert!(call.is_canceled());
        assert!(!call.is_executed());
        assert!(call.execute().await.unwrap_err().is_illegal_state());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropped_execute_ends_canceled() {
        let call = HttpCall::new(hanging_client(), request());

        let elapsed = tokio::time::timeout(Duration::from_millis(10), call.execute()).await;
        assert!(elapsed.is_err());

        assert_eq!(call.state(), CallState::Canceled);
        assert!(call.state().is_terminal());
        assert!(call.is_canceled());

        call.cancel();
        assert_eq!(call.state(), CallState::Canceled);
        assert!(call.execute().await.unwrap_err().is_illegal_state());
    }

    #[tokio::test]
    async fn completed_execute_is_not_abandoned() {
        let call = HttpCall::new(counting_client(Arc::new(AtomicUsize::new(0))), request());
        let response = tokio::time::timeout(Duration::from_secs(5), call.execute()).await.unwrap().unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(call.state(), CallState::Succeeded);
        assert!(!call.is_canceled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_aborts_in_flight_execute() {
        let call: Arc<dyn Call> = Arc::from(hanging_client().new_call(request()));

        let executing = Arc::clone(&call);
        let handle = tokio::spawn(async move { executing.execute().await });

        while !call.is_executed() {
            tokio::task::yield_now().await;
        }
        call.cancel();

        let error = handle.await.unwrap().unwrap_err();
        assert!(error.is_canceled());
        assert!(call.is_canceled());
    }

    #[tokio::test]
    async fn cancel_after_completion_is_noop() {
        let client = counting_client(Arc::new(AtomicUsize::new(0)));
        let call = HttpCall::new(client, request());

        call.execute().await.unwrap();
        call.cancel();

        assert_eq!(call.state(), CallState::Succeeded);
        assert!(!call.is_canceled());
    }

    #[tokio::test]
    async fn cancel_while_queued_reports_cancellation_once() {
        let dispatcher = Arc::new(HeldDispatcher::default());
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let client = Client::builder()
            .transport(transport_fn(move |request: Request, _timeout: Timeout| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { ok(request) }
            }))
            .dispatcher(Arc::clone(&dispatcher))
            .build()
            .unwrap();

        let call = HttpCall::new(client, request());
        let (callback, rx) = callback();
        call.enqueue(callback).unwrap();

        call.cancel();
        call.cancel();
        dispatcher.release();

        let error = rx.await.unwrap().unwrap_err();
        assert!(error.is_canceled());
        assert_eq!(call.state(), CallState::Canceled);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropped_task_still_completes_callback() {
        let dispatcher = Arc::new(HeldDispatcher::default());
        let client = Client::builder()
            .transport(transport_fn(|request: Request, _timeout: Timeout| async move { ok(request) }))
            .dispatcher(Arc::clone(&dispatcher))
            .build()
            .unwrap();

        let call = HttpCall::new(client, request());
        let (callback, rx) = callback();
        call.enqueue(callback).unwrap();
        dispatcher.discard();

        let error = rx.await.unwrap().unwrap_err();
        assert!(matches!(error.as_transport(), Some(TransportError::Interrupted { .. })));
        assert_eq!(call.state(), CallState::Failed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn callback_runs_once_when_cancel_races_enqueue() {
        for _ in 0..64 {
            let deliveries = Arc::new(AtomicUsize::new(0));
            let call: Arc<dyn Call> = Arc::from(hanging_client().new_call(request()));
            let (tx, rx) = oneshot::channel::<()>();

            let counter = Arc::clone(&deliveries);
            let tx = Mutex::new(Some(tx));
            call.enqueue(Box::new(move |result| {
                assert!(result.unwrap_err().is_canceled());
                counter.fetch_add(1, Ordering::SeqCst);
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(());
                }
            }))
            .unwrap();

            let canceler = Arc::clone(&call);
            tokio::spawn(async move { canceler.cancel() }).await.unwrap();

            rx.await.unwrap();
            tokio::task::yield_now().await;
            assert_eq!(deliveries.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn clone_resets_state() {
        let client = counting_client(Arc::new(AtomicUsize::new(0)));
        let call = client.new_call(request());
        call.execute().await.unwrap();

        let clone = call.clone_call();
        assert_eq!(clone.request(), call.request());
        assert!(!clone.is_executed());
        assert!(!clone.is_canceled());
        assert_eq!(clone.execute().await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn clone_of_canceled_call_is_not_canceled() {
        let client = counting_client(Arc::new(AtomicUsize::new(0)));
        let call = client.new_call(request());
        call.cancel();

        let clone = call.clone_call();
        assert!(!clone.is_canceled());
        assert!(!clone.timeout().is_canceled());
    }

    proptest! {
        #[test]
        fn cancel_is_idempotent(times in 1usize..16, executed in any::<bool>()) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async {
                let client = counting_client(Arc::new(AtomicUsize::new(0)));
                let call = HttpCall::new(client, request());
                if executed {
                    call.execute().await.unwrap();
                }

                call.cancel();
                let once = (call.state(), call.is_canceled(), call.is_executed());
                for _ in 1..times {
                    call.cancel();
                }
                prop_assert_eq!((call.state(), call.is_canceled(), call.is_executed()), once);
                Ok(())
            })?;
        }
    }
}
