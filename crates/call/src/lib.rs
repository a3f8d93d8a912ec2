//! Single-use, cancelable HTTP calls.
//!
//! This crate is the execution core of the micro client. It does not speak any wire protocol:
//! bytes are moved by a [`transport::Transport`] and asynchronous executions are scheduled by a
//! [`dispatcher::Dispatcher`], both supplied by the user. What it does own is the lifecycle of
//! one exchange.
//!
//! # Example
//!
//! ```no_run
//! use micro_call::call::{Call, CallFactory};
//! use micro_call::client::Client;
//! use micro_call::protocol::{Request, Response, TransportError};
//! use micro_call::timeout::Timeout;
//! use micro_call::transport::transport_fn;
//! use tracing::info;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .transport(transport_fn(|request: Request, _timeout: Timeout| async move {
//!             Response::builder(request).status(200_u16).body("Hello World!").map_err(TransportError::protocol)
//!         }))
//!         .build()?;
//!
//!     let request = Request::builder().uri("https://api.example.test/hello").build()?;
//!     let call = client.new_call(request);
//!
//!     // blocking style: awaited in the caller's task
//!     let response = call.execute().await?;
//!     info!(status = %response.status(), "received");
//!
//!     // async style: a second call for the same request, completed on the dispatcher
//!     call.clone_call().enqueue(Box::new(|result| match result {
//!         Ok(response) => info!(status = %response.status(), "received"),
//!         Err(e) => info!(cause = %e, "failed"),
//!     }))?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: immutable [`Request`](protocol::Request) and [`Response`](protocol::Response)
//!   values, body handles and the error taxonomy
//! - [`timeout`]: the cancelable deadline shared by a call and its transport
//! - [`call`]: the [`Call`](call::Call) contract and its state machine
//! - [`client`]: [`Client`](client::Client), the default call factory
//! - [`transport`] and [`dispatcher`]: the collaborators a client is wired with
//!
//! # Guarantees
//!
//! A call leaves its initial state exactly once, through `execute` or `enqueue`; every later
//! attempt fails with [`CallError::IllegalState`](protocol::CallError::IllegalState). An
//! enqueued call reports to its callback exactly once, even when canceled while queued or
//! dropped by the dispatcher. Cancellation is cooperative: it aborts the transport future, and
//! a response that won the race is still delivered.

pub mod call;
pub mod client;
pub mod dispatcher;
pub mod protocol;
pub mod timeout;
pub mod transport;
