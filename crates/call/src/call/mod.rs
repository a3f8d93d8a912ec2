//! Single-use request/response exchanges.
//!
//! A [`Call`] wraps one prepared [`Request`]. It can be executed exactly once, either in the
//! caller's task with [`Call::execute`] or on a dispatcher with [`Call::enqueue`], and canceled
//! from anywhere at any time.
//!
//! ```text
//!              execute / enqueue                 ┌──▶ Succeeded
//!   Created ─────────────────────▶ Executing ────┼──▶ Failed
//!      │                               │         └──▶ Canceled
//!      │ cancel                        └ cancel: aborts the transport, ends in Canceled
//!      ▼                                 (unless the exchange completed first)
//!   CanceledIdle
//! ```
//!
//! Every state but `Created` rejects `execute`/`enqueue` with
//! [`CallError::IllegalState`]. [`Call::clone_call`] is the way to run the same request again.

mod http_call;
mod state;

pub use http_call::HttpCall;
pub use state::CallState;

use std::fmt;

use async_trait::async_trait;

use crate::protocol::{CallError, Request, Response};
use crate::timeout::Timeout;

/// Receives the outcome of an enqueued call. Invoked exactly once.
pub type Callback = Box<dyn FnOnce(Result<Response, CallError>) + Send + 'static>;

#[async_trait]
pub trait Call: Send + Sync + fmt::Debug {
    /// The request this call was prepared for.
    fn request(&self) -> &Request;

    /// Performs the exchange, completing when the response head has arrived or the exchange failed.
    ///
    /// Fails with [`CallError::IllegalState`] if the call was already executed, enqueued or
    /// canceled.
    async fn execute(&self) -> Result<Response, CallError>;

    /// Schedules the exchange on the dispatcher and returns immediately.
    ///
    /// Same precondition as [`Call::execute`]; on that error the callback is dropped unused.
    /// Otherwise the callback runs exactly once, with a cancellation failure if the call was
    /// canceled before the transport started.
    fn enqueue(&self, callback: Callback) -> Result<(), CallError>;

    /// Requests the call be aborted. Idempotent, and a no-op once the call has completed.
    fn cancel(&self);

    fn is_executed(&self) -> bool;

    fn is_canceled(&self) -> bool;

    /// The deadline of this call, adjustable until it is executed.
    fn timeout(&self) -> &Timeout;

    /// A new, unexecuted call for the same request.
    fn clone_call(&self) -> Box<dyn Call>;
}

/// Creates calls. The only way higher layers obtain one.
pub trait CallFactory: Send + Sync {
    fn new_call(&self, request: Request) -> Box<dyn Call>;
}

impl<F: CallFactory + ?Sized> CallFactory for std::sync::Arc<F> {
    fn new_call(&self, request: Request) -> Box<dyn Call> {
        (**self).new_call(request)
    }
}
